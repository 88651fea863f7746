// 🔗 Reconstruction Layer
// Re-joins fact tables to the dimensions and produces labeled, id-free views.
//
// Join rules:
// - History is an INNER join: a fact row whose hist_id has no history row is dropped
// - Conference, player and team are LEFT joins: a miss leaves the label null
//
// Every view is computed from a borrowed snapshot and never mutates it.

use crate::consolidator::ConsolidatedTables;
use crate::entities::{Conference, History, Player, Team};
use crate::error::Result;
use crate::facts::{PlayerStatRow, TeamStatRow};
use crate::schema::{StatFamily, StatKind, PLAYER_STAT_COLUMNS, TEAM_STAT_COLUMNS};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;

/// Label columns prepended to player views, in display order
pub const PLAYER_LABEL_COLUMNS: &[&str] = &[
    "year",
    "conference",
    "player_name",
    "team_name",
    "position",
    "jersey_number",
    "height",
];

/// Label columns prepended to team views, in display order
pub const TEAM_LABEL_COLUMNS: &[&str] = &["year", "conference", "team_name"];

/// Shown for a described player without a recorded position
pub const UNKNOWN_POSITION: &str = "O";

const PLAYER_PREFIX: &str = "ply_";
const TEAM_PREFIX: &str = "tm_";

// ============================================================================
// LABELED TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    fn text(value: Option<&str>) -> Cell {
        value.map_or(Cell::Null, |v| Cell::Text(v.to_string()))
    }

    fn real(value: Option<f64>) -> Cell {
        value.map_or(Cell::Null, Cell::Real)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Real(v) => Some(*v),
            Cell::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Real(v) => write!(f, "{}", v),
            Cell::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Analyst-facing result set: named columns, typed cells, no surrogate ids
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl LabeledTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column name)
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }

    /// Header line plus one record per row; nulls become empty fields
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Array of objects keyed by column name
    pub fn to_json(&self) -> serde_json::Value {
        let records = self
            .rows
            .iter()
            .map(|row| {
                let object: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(cell_to_json))
                    .collect();
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(records)
    }
}

fn cell_to_json(cell: &Cell) -> serde_json::Value {
    match cell {
        Cell::Null => serde_json::Value::Null,
        Cell::Integer(v) => serde_json::Value::from(*v),
        Cell::Real(v) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Cell::Text(v) => serde_json::Value::String(v.clone()),
    }
}

// ============================================================================
// INTERMEDIATE FRAMES
// ============================================================================

/// Business key carried through joins until labeling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FactKey {
    team_id: i64,
    hist_id: i64,
    player_id: Option<i64>,
}

/// Unlabeled join result: key + stat values under `columns`
struct Frame {
    columns: Vec<String>,
    rows: Vec<(FactKey, Vec<Option<f64>>)>,
}

impl Frame {
    fn from_players(rows: &[PlayerStatRow]) -> Frame {
        Frame {
            columns: PLAYER_STAT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| {
                    let key = FactKey {
                        team_id: r.team_id,
                        hist_id: r.hist_id,
                        player_id: Some(r.player_id),
                    };
                    (key, r.stats.clone())
                })
                .collect(),
        }
    }

    fn from_teams(rows: &[TeamStatRow]) -> Frame {
        Frame {
            columns: TEAM_STAT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| {
                    let key = FactKey {
                        team_id: r.team_id,
                        hist_id: r.hist_id,
                        player_id: None,
                    };
                    (key, r.stats.clone())
                })
                .collect(),
        }
    }

    fn renamed(mut self, rename: impl Fn(&str) -> String) -> Frame {
        self.columns = self.columns.iter().map(|c| rename(c.as_str())).collect();
        self
    }

    /// Inner join on the full key; left order is preserved, every match emitted
    fn inner_join(&self, right: &Frame, left_suffix: &str, right_suffix: &str) -> Frame {
        let mut index: HashMap<FactKey, Vec<&Vec<Option<f64>>>> = HashMap::new();
        for (key, values) in &right.rows {
            index.entry(*key).or_default().push(values);
        }

        let columns = self
            .columns
            .iter()
            .map(|c| format!("{}{}", c, left_suffix))
            .chain(right.columns.iter().map(|c| format!("{}{}", c, right_suffix)))
            .collect();

        let mut rows = Vec::new();
        for (key, left) in &self.rows {
            if let Some(matches) = index.get(key) {
                for matched in matches {
                    let values = left.iter().chain(matched.iter()).copied().collect();
                    rows.push((*key, values));
                }
            }
        }

        Frame { columns, rows }
    }

    /// Left join of player rows to team rows on (team_id, hist_id)
    fn left_join_team(&self, teams: &Frame) -> Frame {
        let mut index: HashMap<(i64, i64), Vec<&Vec<Option<f64>>>> = HashMap::new();
        for (key, values) in &teams.rows {
            index
                .entry((key.team_id, key.hist_id))
                .or_default()
                .push(values);
        }

        let columns = self
            .columns
            .iter()
            .chain(teams.columns.iter())
            .cloned()
            .collect();
        let missing = vec![None; teams.columns.len()];

        let mut rows = Vec::new();
        for (key, left) in &self.rows {
            match index.get(&(key.team_id, key.hist_id)) {
                Some(matches) => {
                    for matched in matches {
                        let values = left.iter().chain(matched.iter()).copied().collect();
                        rows.push((*key, values));
                    }
                }
                None => {
                    let values = left.iter().chain(missing.iter()).copied().collect();
                    rows.push((*key, values));
                }
            }
        }

        Frame { columns, rows }
    }
}

// ============================================================================
// RECONSTRUCTOR
// ============================================================================

/// Read-only view builder over one consolidated snapshot
pub struct Reconstructor<'a> {
    tables: &'a ConsolidatedTables,
    teams: HashMap<i64, &'a Team>,
    players: HashMap<i64, &'a Player>,
    conferences: HashMap<i64, &'a Conference>,
    histories: HashMap<i64, &'a History>,
}

impl<'a> Reconstructor<'a> {
    pub fn new(tables: &'a ConsolidatedTables) -> Self {
        let dims = &tables.dimensions;
        Reconstructor {
            tables,
            teams: dims.teams.iter().map(|t| (t.id, t)).collect(),
            players: dims.players.iter().map(|p| (p.id, p)).collect(),
            conferences: dims.conferences.iter().map(|c| (c.id, c)).collect(),
            histories: dims.histories.iter().map(|h| (h.id, h)).collect(),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn total_player(&self) -> LabeledTable {
        self.labeled_player_stat(StatFamily::Total)
    }

    pub fn avg_player(&self) -> LabeledTable {
        self.labeled_player_stat(StatFamily::Average)
    }

    pub fn total_team(&self) -> LabeledTable {
        self.labeled_team_stat(StatFamily::Total)
    }

    pub fn avg_team(&self) -> LabeledTable {
        self.labeled_team_stat(StatFamily::Average)
    }

    pub fn avg_total_player(&self) -> LabeledTable {
        self.combined_avg_and_total(StatKind::Player)
    }

    pub fn avg_total_team(&self) -> LabeledTable {
        self.combined_avg_and_total(StatKind::Team)
    }

    /// Player stats of one family next to their team's stats of the same family
    pub fn player_team(&self, family: StatFamily) -> LabeledTable {
        self.label(StatKind::Player, &self.player_team_frame(family))
    }

    /// Average and total player_team frames joined on (team, history, player)
    pub fn full_join(&self) -> LabeledTable {
        let avg = self.player_team_frame(StatFamily::Average);
        let total = self.player_team_frame(StatFamily::Total);
        let joined = avg.inner_join(
            &total,
            StatFamily::Average.suffix(),
            StatFamily::Total.suffix(),
        );
        self.label(StatKind::Player, &joined)
    }

    // ------------------------------------------------------------------------
    // Building blocks
    // ------------------------------------------------------------------------

    pub fn labeled_player_stat(&self, family: StatFamily) -> LabeledTable {
        let frame = Frame::from_players(self.tables.facts.player(family));
        self.label(StatKind::Player, &frame)
    }

    pub fn labeled_team_stat(&self, family: StatFamily) -> LabeledTable {
        let frame = Frame::from_teams(self.tables.facts.team(family));
        self.label(StatKind::Team, &frame)
    }

    pub fn combined_avg_and_total(&self, kind: StatKind) -> LabeledTable {
        let (avg, total) = match kind {
            StatKind::Player => (
                Frame::from_players(&self.tables.facts.avg_player),
                Frame::from_players(&self.tables.facts.total_player),
            ),
            StatKind::Team => (
                Frame::from_teams(&self.tables.facts.avg_team),
                Frame::from_teams(&self.tables.facts.total_team),
            ),
        };
        let joined = avg.inner_join(
            &total,
            StatFamily::Average.suffix(),
            StatFamily::Total.suffix(),
        );
        self.label(kind, &joined)
    }

    fn player_team_frame(&self, family: StatFamily) -> Frame {
        let players = Frame::from_players(self.tables.facts.player(family))
            .renamed(|c| format!("{}{}", PLAYER_PREFIX, c));
        let teams = Frame::from_teams(self.tables.facts.team(family))
            .renamed(|c| format!("{}{}", TEAM_PREFIX, c));
        players.left_join_team(&teams)
    }

    /// Swap keys for labels: inner join on history, left join on the rest
    fn label(&self, kind: StatKind, frame: &Frame) -> LabeledTable {
        let label_columns = match kind {
            StatKind::Player => PLAYER_LABEL_COLUMNS,
            StatKind::Team => TEAM_LABEL_COLUMNS,
        };
        let columns = label_columns
            .iter()
            .map(|c| c.to_string())
            .chain(frame.columns.iter().cloned())
            .collect();

        let mut rows = Vec::with_capacity(frame.rows.len());
        for (key, values) in &frame.rows {
            let Some(history) = self.histories.get(&key.hist_id) else {
                continue;
            };

            let conference = self
                .conferences
                .get(&history.conference_id)
                .map(|c| c.label.as_str());
            let team = self.teams.get(&key.team_id).map(|t| t.name.as_str());

            let mut row = vec![Cell::Integer(i64::from(history.year)), Cell::text(conference)];
            match kind {
                StatKind::Player => {
                    let player = key.player_id.and_then(|id| self.players.get(&id));
                    row.push(Cell::text(player.map(|p| p.name.as_str())));
                    row.push(Cell::text(team));
                    row.push(Cell::text(
                        player.map(|p| p.position.as_deref().unwrap_or(UNKNOWN_POSITION)),
                    ));
                    row.push(Cell::text(player.and_then(|p| p.jersey_number.as_deref())));
                    row.push(Cell::text(player.and_then(|p| p.height.as_deref())));
                }
                StatKind::Team => row.push(Cell::text(team)),
            }
            row.extend(values.iter().map(|v| Cell::real(*v)));
            rows.push(row);
        }

        LabeledTable { columns, rows }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::FactTables;
    use crate::registry::DimensionTables;

    fn player_row(team_id: i64, hist_id: i64, player_id: i64, minutes: f64) -> PlayerStatRow {
        let mut stats = vec![None; PLAYER_STAT_COLUMNS.len()];
        stats[1] = Some(minutes);
        PlayerStatRow {
            team_id,
            hist_id,
            player_id,
            stats,
        }
    }

    fn team_row(team_id: i64, hist_id: i64, games: f64) -> TeamStatRow {
        let mut stats = vec![None; TEAM_STAT_COLUMNS.len()];
        stats[0] = Some(games);
        TeamStatRow {
            team_id,
            hist_id,
            stats,
        }
    }

    fn snapshot() -> ConsolidatedTables {
        ConsolidatedTables {
            dimensions: DimensionTables {
                teams: vec![Team::new(0, "AA"), Team::new(1, "BB")],
                players: vec![
                    Player {
                        id: 0,
                        name: "Smith".to_string(),
                        jersey_number: Some("7".to_string()),
                        height: Some("6-2".to_string()),
                        position: Some("G".to_string()),
                    },
                    Player::new(1, "Cruz", None),
                ],
                conferences: vec![Conference::new(0, "PH")],
                histories: vec![History::new(0, 2021, 0)],
            },
            facts: FactTables {
                total_player: vec![player_row(0, 0, 0, 300.0), player_row(1, 0, 1, 120.0)],
                avg_player: vec![player_row(0, 0, 0, 30.0), player_row(1, 0, 1, 12.0)],
                total_team: vec![team_row(0, 0, 10.0)],
                avg_team: vec![team_row(0, 0, 1.0)],
            },
        }
    }

    #[test]
    fn test_labels_match_referenced_dimensions() {
        let tables = snapshot();
        let view = Reconstructor::new(&tables).total_player();

        assert_eq!(&view.columns[..7], PLAYER_LABEL_COLUMNS);
        assert_eq!(view.columns.len(), 7 + PLAYER_STAT_COLUMNS.len());
        assert!(!view.columns.iter().any(|c| c.ends_with("_id")));
        assert_eq!(view.len(), 2);

        assert_eq!(view.get(0, "year"), Some(&Cell::Integer(2021)));
        assert_eq!(view.get(0, "conference").and_then(Cell::as_str), Some("PH"));
        assert_eq!(view.get(0, "player_name").and_then(Cell::as_str), Some("Smith"));
        assert_eq!(view.get(0, "team_name").and_then(Cell::as_str), Some("AA"));
        assert_eq!(view.get(0, "position").and_then(Cell::as_str), Some("G"));
        assert_eq!(view.get(0, "MIN").and_then(Cell::as_f64), Some(300.0));
        assert_eq!(view.get(1, "height"), Some(&Cell::Null));
    }

    #[test]
    fn test_missing_position_shown_as_unknown() {
        let mut tables = snapshot();
        tables.facts.total_player.push(player_row(1, 0, 9, 5.0));

        let view = Reconstructor::new(&tables).total_player();

        assert_eq!(view.get(1, "position").and_then(Cell::as_str), Some(UNKNOWN_POSITION));
        assert_eq!(view.get(1, "jersey_number"), Some(&Cell::Null));
        // Unknown player id: every player label stays null
        assert_eq!(view.get(2, "player_name"), Some(&Cell::Null));
        assert_eq!(view.get(2, "position"), Some(&Cell::Null));
    }

    #[test]
    fn test_missing_history_drops_row() {
        let mut tables = snapshot();
        tables.facts.total_player.push(player_row(0, 7, 0, 50.0));

        let view = Reconstructor::new(&tables).total_player();

        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_missing_team_keeps_row_with_null_label() {
        let mut tables = snapshot();
        tables.facts.total_team.push(team_row(9, 0, 4.0));

        let view = Reconstructor::new(&tables).total_team();

        assert_eq!(view.columns[..3], ["year", "conference", "team_name"]);
        assert_eq!(view.len(), 2);
        assert_eq!(view.get(1, "team_name"), Some(&Cell::Null));
        assert_eq!(view.get(1, "GP").and_then(Cell::as_f64), Some(4.0));
    }

    #[test]
    fn test_combined_suffixes_and_inner_join() {
        let mut tables = snapshot();
        tables.facts.total_player.push(player_row(0, 0, 1, 80.0));

        let view = Reconstructor::new(&tables).avg_total_player();

        assert_eq!(view.len(), 2);
        assert_eq!(view.get(0, "MIN_avg").and_then(Cell::as_f64), Some(30.0));
        assert_eq!(view.get(0, "MIN_total").and_then(Cell::as_f64), Some(300.0));
        assert!(view.column_index("MIN").is_none());

        let view = Reconstructor::new(&tables).avg_total_team();
        assert_eq!(view.len(), 1);
        assert_eq!(view.get(0, "GP_total").and_then(Cell::as_f64), Some(10.0));
    }

    #[test]
    fn test_player_team_left_join() {
        let tables = snapshot();
        let view = Reconstructor::new(&tables).player_team(StatFamily::Total);

        assert_eq!(view.len(), 2);
        assert_eq!(view.get(0, "ply_MIN").and_then(Cell::as_f64), Some(300.0));
        assert_eq!(view.get(0, "tm_GP").and_then(Cell::as_f64), Some(10.0));
        // BB has no team-stat row
        assert_eq!(view.get(1, "tm_GP"), Some(&Cell::Null));
    }

    #[test]
    fn test_full_join() {
        let tables = snapshot();
        let view = Reconstructor::new(&tables).full_join();

        assert_eq!(view.len(), 2);
        assert_eq!(view.get(0, "ply_MIN_avg").and_then(Cell::as_f64), Some(30.0));
        assert_eq!(view.get(0, "tm_GP_total").and_then(Cell::as_f64), Some(10.0));
        assert_eq!(view.get(1, "tm_GP_avg"), Some(&Cell::Null));
        assert_eq!(view.get(1, "player_name").and_then(Cell::as_str), Some("Cruz"));
    }

    #[test]
    fn test_views_are_idempotent() {
        let tables = snapshot();
        let before = tables.clone();
        let reconstructor = Reconstructor::new(&tables);

        assert_eq!(reconstructor.full_join(), reconstructor.full_join());
        assert_eq!(reconstructor.avg_team(), reconstructor.avg_team());
        assert_eq!(tables, before);
    }

    #[test]
    fn test_csv_and_json_output() {
        let tables = snapshot();
        let view = Reconstructor::new(&tables).total_team();

        let mut buf = Vec::new();
        view.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("year,conference,team_name,GP,3Pm"));
        assert!(lines.next().unwrap().starts_with("2021,PH,AA,10,,"));

        let json = view.to_json();
        assert_eq!(json[0]["team_name"], "AA");
        assert_eq!(json[0]["GP"], 10.0);
        assert!(json[0]["PTS"].is_null());
    }
}
