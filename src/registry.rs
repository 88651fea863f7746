// 🗂️ Dimension Registry
// Deduplicates teams, players, conferences and season history, handing out
// stable surrogate ids.
//
// Ids are dense and zero-based: a new row gets the table's length before
// insertion. Lookups go through a natural-key → id hash map, never a scan.

use crate::entities::{Conference, History, Player, PlayerDirectory, Team};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

// ============================================================================
// LOOKUP POLICY
// ============================================================================

/// How `find_history` behaves when the (year, conference) is unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryLookup {
    /// Absence creates a new history row (same as `resolve_history`)
    #[default]
    CreateOnMiss,
    /// Absence is an error
    Strict,
}

/// Natural key of one of the four dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalKey<'a> {
    Team(&'a str),
    Player(&'a str),
    Conference(&'a str),
    History { year: i32, conference_id: i64 },
}

// ============================================================================
// DIMENSION TABLES
// ============================================================================

/// The four finished dimension tables, ordered by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionTables {
    pub teams: Vec<Team>,
    pub players: Vec<Player>,
    pub conferences: Vec<Conference>,
    pub histories: Vec<History>,
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Owned, per-run registry. Created at run start, consumed by `into_tables`.
pub struct DimensionRegistry {
    tables: DimensionTables,
    team_ids: HashMap<String, i64>,
    player_ids: HashMap<String, i64>,
    conference_ids: HashMap<String, i64>,
    history_ids: HashMap<(i32, i64), i64>,
    directory: PlayerDirectory,
    history_lookup: HistoryLookup,
}

impl DimensionRegistry {
    pub fn new(directory: PlayerDirectory) -> Self {
        DimensionRegistry {
            tables: DimensionTables::default(),
            team_ids: HashMap::new(),
            player_ids: HashMap::new(),
            conference_ids: HashMap::new(),
            history_ids: HashMap::new(),
            directory,
            history_lookup: HistoryLookup::default(),
        }
    }

    pub fn with_history_lookup(mut self, history_lookup: HistoryLookup) -> Self {
        self.history_lookup = history_lookup;
        self
    }

    /// Resolve any dimension by natural key
    pub fn resolve(&mut self, key: NaturalKey<'_>) -> i64 {
        match key {
            NaturalKey::Team(name) => self.resolve_team(name),
            NaturalKey::Player(name) => self.resolve_player(name),
            NaturalKey::Conference(code) => self.resolve_conference(code),
            NaturalKey::History {
                year,
                conference_id,
            } => self.resolve_history(year, conference_id),
        }
    }

    pub fn resolve_team(&mut self, name: &str) -> i64 {
        if let Some(&id) = self.team_ids.get(name) {
            return id;
        }

        let id = self.tables.teams.len() as i64;
        self.tables.teams.push(Team::new(id, name));
        self.team_ids.insert(name.to_string(), id);
        debug!(team_id = id, name, "New team");
        id
    }

    /// Attributes come from the description directory at creation time only
    pub fn resolve_player(&mut self, name: &str) -> i64 {
        if let Some(&id) = self.player_ids.get(name) {
            return id;
        }

        let id = self.tables.players.len() as i64;
        let description = self.directory.describe(name);
        if description.is_none() && !self.directory.is_empty() {
            warn!(name, "Player not found in description source");
        }
        self.tables.players.push(Player::new(id, name, description));
        self.player_ids.insert(name.to_string(), id);
        debug!(player_id = id, name, "New player");
        id
    }

    pub fn resolve_conference(&mut self, code: &str) -> i64 {
        if let Some(&id) = self.conference_ids.get(code) {
            return id;
        }

        let id = self.tables.conferences.len() as i64;
        self.tables.conferences.push(Conference::new(id, code));
        self.conference_ids.insert(code.to_string(), id);
        debug!(conference_id = id, code, "New conference");
        id
    }

    pub fn resolve_history(&mut self, year: i32, conference_id: i64) -> i64 {
        if let Some(&id) = self.history_ids.get(&(year, conference_id)) {
            return id;
        }

        let id = self.tables.histories.len() as i64;
        self.tables
            .histories
            .push(History::new(id, year, conference_id));
        self.history_ids.insert((year, conference_id), id);
        debug!(hist_id = id, year, conference_id, "New history");
        id
    }

    /// History lookup used by team-stat ingestion.
    ///
    /// Under `HistoryLookup::CreateOnMiss` this is identical to
    /// `resolve_history`. Under `HistoryLookup::Strict` a miss is an error.
    pub fn find_history(&mut self, year: i32, conference_id: i64) -> Result<i64> {
        match self.history_lookup {
            HistoryLookup::CreateOnMiss => Ok(self.resolve_history(year, conference_id)),
            HistoryLookup::Strict => self
                .history_ids
                .get(&(year, conference_id))
                .copied()
                .ok_or(Error::UnknownHistory {
                    year,
                    conference_id,
                }),
        }
    }

    pub fn tables(&self) -> &DimensionTables {
        &self.tables
    }

    /// Finish the run and hand over the dimension tables
    pub fn into_tables(self) -> DimensionTables {
        self.tables
    }
}

impl Default for DimensionRegistry {
    fn default() -> Self {
        Self::new(PlayerDirectory::empty())
    }
}

// ============================================================================
// TESTS
// ============================================================================
