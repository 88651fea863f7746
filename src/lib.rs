// PBA Stats - Core Library
// Consolidates per-team / per-season stat CSVs into a normalized store and
// rebuilds labeled views from it. Used by the CLI and the integration tests.

pub mod error;
pub mod config;
pub mod schema;         // Column catalogs, table names, DDL
pub mod entities;       // Team / Player / Conference / History
pub mod registry;       // Dimension Registry: surrogate id assignment
pub mod parser;         // File-name classification + raw CSV loading
pub mod deduplication;  // Exact and business-key dedup passes
pub mod facts;          // Fact tables
pub mod normalizer;     // One raw file -> fact rows
pub mod consolidator;   // Orchestrator for a full run
pub mod db;             // SQLite persistence
pub mod reconstruction; // Labeled views

// Re-export commonly used types
pub use error::{Error, Result};
pub use config::ConsolidatorConfig;
pub use schema::{StatFamily, StatKind, PLAYER_STAT_COLUMNS, TEAM_STAT_COLUMNS};
pub use entities::{Conference, History, Player, PlayerDescription, PlayerDirectory, Team};
pub use registry::{DimensionRegistry, DimensionTables, HistoryLookup, NaturalKey};
pub use parser::{
    classify, classify_player_stat_file, classify_team_stat_file,
    discover_csv_files, FileDescriptor, RawRecord, RawTable,
};
pub use deduplication::{dedup_by_key, dedup_exact, Deduplicated, MatchStrategy};
pub use facts::{FactTables, PlayerStatRow, TeamStatRow};
pub use normalizer::{normalize_player_stat, normalize_team_stat, Normalized};
pub use consolidator::{
    ConsolidatedTables, Consolidation, ConsolidationReport, Consolidator,
};
pub use db::{SqliteStore, TableStore};
pub use reconstruction::{Cell, LabeledTable, Reconstructor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a full consolidation and replace the store's contents with the result
pub fn consolidate_into<S: TableStore>(
    config: ConsolidatorConfig,
    store: &mut S,
) -> Result<ConsolidationReport> {
    let (tables, report) = Consolidator::new(config).run()?;
    store.replace_all(&tables)?;
    Ok(report)
}
