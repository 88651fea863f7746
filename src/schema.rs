// 📐 Fixed table schemas
// Column catalogs for raw inputs and normalized tables, plus SQLite DDL

use serde::{Deserialize, Serialize};

// ============================================================================
// STAT FAMILIES
// ============================================================================

/// Total vs. average variant of the same stat category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatFamily {
    Total,
    Average,
}

impl StatFamily {
    /// Code used in input file names
    pub fn code(&self) -> &'static str {
        match self {
            StatFamily::Total => "TOT",
            StatFamily::Average => "AVG",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "TOT" => Some(StatFamily::Total),
            "AVG" => Some(StatFamily::Average),
            _ => None,
        }
    }

    /// Suffix applied to stat columns when both families share a view
    pub fn suffix(&self) -> &'static str {
        match self {
            StatFamily::Total => "_total",
            StatFamily::Average => "_avg",
        }
    }
}

/// Player-level vs. team-level stat facts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Player,
    Team,
}

impl StatKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatKind::Player => "player-stat",
            StatKind::Team => "team-stat",
        }
    }

    /// Stat columns carried by this kind, in final order
    pub fn stat_columns(&self) -> &'static [&'static str] {
        match self {
            StatKind::Player => PLAYER_STAT_COLUMNS,
            StatKind::Team => TEAM_STAT_COLUMNS,
        }
    }

    /// Persisted table name for a family of this kind
    pub fn table_name(&self, family: StatFamily) -> &'static str {
        match (self, family) {
            (StatKind::Player, StatFamily::Total) => TOTAL_STAT_TABLE,
            (StatKind::Player, StatFamily::Average) => AVG_STAT_TABLE,
            (StatKind::Team, StatFamily::Total) => TEAM_TOTAL_STAT_TABLE,
            (StatKind::Team, StatFamily::Average) => TEAM_AVG_STAT_TABLE,
        }
    }
}

// ============================================================================
// COLUMN CATALOGS
// ============================================================================

/// Raw player-name column in player-stat files
pub const PLAYER_NAME_COLUMN: &str = "PLAYERS";

/// Raw team-name column (both raw schemas)
pub const TEAM_NAME_COLUMN: &str = "Team";

/// Minutes played, used by the zero-record drop rule
pub const MINUTES_COLUMN: &str = "MIN";

/// Plus-minus, used by the zero-record drop rule
pub const PLUS_MINUS_COLUMN: &str = "+/-";

pub const PLAYER_STAT_COLUMNS: &[&str] = &[
    "GP", "MIN", "FGm", "FGa", "FG%", "3Pm", "3Pa", "3P%", "FTm", "FTa", "FT%", "APG", "STL",
    "BLK", "oREB", "dREB", "REB", "PF", "TOV", "+/-", "PTS",
];

pub const TEAM_STAT_COLUMNS: &[&str] = &[
    "GP", "3Pm", "3Pa", "3P%", "2Pm", "2Pa", "2P%", "FGm", "FGa", "FG%", "FTm", "FTa", "FT%",
    "dREB", "oREB", "REB", "AST", "STL", "BLK", "TO", "PTO", "PF", "FBm", "FBa", "FBm%", "bPTS",
    "PTS", "W", "L",
];

/// Percentage-valued columns are marked by a "%" in the header
pub fn is_percentage_column(name: &str) -> bool {
    name.contains('%')
}

/// Position of a stat column inside a catalog
pub fn stat_index(columns: &[&str], name: &str) -> Option<usize> {
    columns.iter().position(|c| *c == name)
}

// ============================================================================
// TABLE NAMES
// ============================================================================

pub const TOTAL_STAT_TABLE: &str = "total_stat";
pub const AVG_STAT_TABLE: &str = "avg_stat";
pub const TEAM_TOTAL_STAT_TABLE: &str = "team_total_stat";
pub const TEAM_AVG_STAT_TABLE: &str = "team_avg_stat";
pub const HISTORY_TABLE: &str = "history";
pub const CONFERENCE_TABLE: &str = "conference";
pub const PLAYER_TABLE: &str = "player";
pub const TEAM_TABLE: &str = "team";

/// All persisted tables, dimensions first
pub const ALL_TABLES: &[&str] = &[
    TEAM_TABLE,
    PLAYER_TABLE,
    CONFERENCE_TABLE,
    HISTORY_TABLE,
    TOTAL_STAT_TABLE,
    AVG_STAT_TABLE,
    TEAM_TOTAL_STAT_TABLE,
    TEAM_AVG_STAT_TABLE,
];

// ============================================================================
// DDL
// ============================================================================

/// Quote an identifier for SQLite ("3P%", "+/-" are not bare identifiers)
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn dimension_ddl() -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE {TEAM_TABLE} (
                id INTEGER PRIMARY KEY,
                team_name TEXT NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE {PLAYER_TABLE} (
                id INTEGER PRIMARY KEY,
                player_name TEXT NOT NULL,
                jersey_number TEXT,
                height TEXT,
                position TEXT
            )"
        ),
        format!(
            "CREATE TABLE {CONFERENCE_TABLE} (
                id INTEGER PRIMARY KEY,
                conference TEXT NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE {HISTORY_TABLE} (
                id INTEGER PRIMARY KEY,
                year INTEGER NOT NULL,
                conference_id INTEGER NOT NULL
            )"
        ),
    ]
}

/// Foreign-key columns of a fact table, in final order
pub fn fact_key_columns(kind: StatKind) -> &'static [&'static str] {
    match kind {
        StatKind::Player => &["team_id", "hist_id", "player_id"],
        StatKind::Team => &["team_id", "hist_id"],
    }
}

/// CREATE TABLE for one fact table
pub fn fact_ddl(kind: StatKind, family: StatFamily) -> String {
    let mut columns: Vec<String> = fact_key_columns(kind)
        .iter()
        .map(|c| format!("    {} INTEGER NOT NULL", c))
        .collect();
    columns.extend(
        kind.stat_columns()
            .iter()
            .map(|c| format!("    {} REAL", quote_ident(c))),
    );

    format!(
        "CREATE TABLE {} (\n{}\n)",
        kind.table_name(family),
        columns.join(",\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(PLAYER_STAT_COLUMNS.len(), 21);
        assert_eq!(TEAM_STAT_COLUMNS.len(), 29);
    }

    #[test]
    fn test_percentage_columns() {
        let player: Vec<&str> = PLAYER_STAT_COLUMNS
            .iter()
            .copied()
            .filter(|c| is_percentage_column(c))
            .collect();
        assert_eq!(player, vec!["FG%", "3P%", "FT%"]);

        let team: Vec<&str> = TEAM_STAT_COLUMNS
            .iter()
            .copied()
            .filter(|c| is_percentage_column(c))
            .collect();
        assert_eq!(team, vec!["3P%", "2P%", "FG%", "FT%", "FBm%"]);
    }

    #[test]
    fn test_family_codes() {
        assert_eq!(StatFamily::from_code("TOT"), Some(StatFamily::Total));
        assert_eq!(StatFamily::from_code("AVG"), Some(StatFamily::Average));
        assert_eq!(StatFamily::from_code("avg"), None);
        assert_eq!(StatFamily::Average.code(), "AVG");
    }

    #[test]
    fn test_fact_ddl_quotes_symbols() {
        let sql = fact_ddl(StatKind::Player, StatFamily::Total);
        assert!(sql.starts_with("CREATE TABLE total_stat"));
        assert!(sql.contains("player_id INTEGER NOT NULL"));
        assert!(sql.contains("\"+/-\" REAL"));
        assert!(sql.contains("\"3P%\" REAL"));

        let sql = fact_ddl(StatKind::Team, StatFamily::Average);
        assert!(sql.starts_with("CREATE TABLE team_avg_stat"));
        assert!(!sql.contains("player_id"));
    }

    #[test]
    fn test_table_names() {
        assert_eq!(StatKind::Team.table_name(StatFamily::Total), "team_total_stat");
        assert_eq!(StatKind::Player.table_name(StatFamily::Average), "avg_stat");
        assert_eq!(ALL_TABLES.len(), 8);
    }
}
