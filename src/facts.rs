// Fact tables: measured stats referencing dimensions by surrogate id

use crate::schema::{stat_index, StatFamily, StatKind, PLAYER_STAT_COLUMNS, TEAM_STAT_COLUMNS};
use serde::{Deserialize, Serialize};

/// One player's line for one team and season. `stats` follows `PLAYER_STAT_COLUMNS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatRow {
    pub team_id: i64,
    pub hist_id: i64,
    pub player_id: i64,
    pub stats: Vec<Option<f64>>,
}

impl PlayerStatRow {
    pub fn key(&self) -> (i64, i64, i64) {
        (self.team_id, self.hist_id, self.player_id)
    }

    pub fn stat(&self, column: &str) -> Option<f64> {
        stat_index(PLAYER_STAT_COLUMNS, column).and_then(|i| self.stats.get(i).copied().flatten())
    }
}

/// One team's line for one season. `stats` follows `TEAM_STAT_COLUMNS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatRow {
    pub team_id: i64,
    pub hist_id: i64,
    pub stats: Vec<Option<f64>>,
}

impl TeamStatRow {
    pub fn key(&self) -> (i64, i64) {
        (self.team_id, self.hist_id)
    }

    pub fn stat(&self, column: &str) -> Option<f64> {
        stat_index(TEAM_STAT_COLUMNS, column).and_then(|i| self.stats.get(i).copied().flatten())
    }
}

/// The four fact tables: (total, average) × (player, team)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactTables {
    pub total_player: Vec<PlayerStatRow>,
    pub avg_player: Vec<PlayerStatRow>,
    pub total_team: Vec<TeamStatRow>,
    pub avg_team: Vec<TeamStatRow>,
}

impl FactTables {
    pub fn player(&self, family: StatFamily) -> &[PlayerStatRow] {
        match family {
            StatFamily::Total => &self.total_player,
            StatFamily::Average => &self.avg_player,
        }
    }

    pub fn player_mut(&mut self, family: StatFamily) -> &mut Vec<PlayerStatRow> {
        match family {
            StatFamily::Total => &mut self.total_player,
            StatFamily::Average => &mut self.avg_player,
        }
    }

    pub fn team(&self, family: StatFamily) -> &[TeamStatRow] {
        match family {
            StatFamily::Total => &self.total_team,
            StatFamily::Average => &self.avg_team,
        }
    }

    pub fn team_mut(&mut self, family: StatFamily) -> &mut Vec<TeamStatRow> {
        match family {
            StatFamily::Total => &mut self.total_team,
            StatFamily::Average => &mut self.avg_team,
        }
    }

    /// Row count of one fact table
    pub fn count(&self, kind: StatKind, family: StatFamily) -> usize {
        match kind {
            StatKind::Player => self.player(family).len(),
            StatKind::Team => self.team(family).len(),
        }
    }
}
