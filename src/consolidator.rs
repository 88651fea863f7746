// 🔄 Consolidation Orchestrator
// Drives one full ingestion run: player-stat files first (they seed
// conference/history), then team-stat files, then hands back all eight tables.

use crate::config::ConsolidatorConfig;
use crate::entities::PlayerDirectory;
use crate::error::{Error, Result};
use crate::facts::FactTables;
use crate::normalizer::{normalize_player_stat, normalize_team_stat};
use crate::parser::{classify, discover_csv_files, FileDescriptor, RawTable};
use crate::registry::{DimensionRegistry, DimensionTables, HistoryLookup};
use crate::schema::{StatFamily, StatKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

// ============================================================================
// OUTPUT
// ============================================================================

/// Everything one run produces: four dimension tables + four fact tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedTables {
    pub dimensions: DimensionTables,
    pub facts: FactTables,
}

/// Summary of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub player_stat_files: usize,
    pub team_stat_files: usize,
    pub rows_read: usize,
    pub exact_duplicates: usize,
    pub key_duplicates: usize,
    pub zero_records: usize,
    pub table_counts: Vec<(String, usize)>,
}

// ============================================================================
// RUN STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    PlayerStats,
    TeamStats,
}

/// In-progress run. Owns the registry for the whole pass; discarded by `finish`.
pub struct Consolidation {
    registry: DimensionRegistry,
    facts: FactTables,
    // Business keys already accumulated, per family, across files
    player_keys: HashMap<StatFamily, HashSet<(i64, i64, i64)>>,
    team_keys: HashMap<StatFamily, HashSet<(i64, i64)>>,
    phase: Phase,
    started_at: DateTime<Utc>,
    player_stat_files: usize,
    team_stat_files: usize,
    rows_read: usize,
    exact_duplicates: usize,
    key_duplicates: usize,
    zero_records: usize,
}

impl Consolidation {
    pub fn new(registry: DimensionRegistry) -> Self {
        Consolidation {
            registry,
            facts: FactTables::default(),
            player_keys: HashMap::new(),
            team_keys: HashMap::new(),
            phase: Phase::PlayerStats,
            started_at: Utc::now(),
            player_stat_files: 0,
            team_stat_files: 0,
            rows_read: 0,
            exact_duplicates: 0,
            key_duplicates: 0,
            zero_records: 0,
        }
    }

    /// Normalize one player-stat file into the accumulator of its family
    pub fn ingest_player_stat(&mut self, descriptor: &FileDescriptor, raw: RawTable) -> Result<()> {
        if self.phase != Phase::PlayerStats {
            return Err(Error::OutOfOrder("player-stat file after team-stat ingestion began"));
        }

        let out = normalize_player_stat(&mut self.registry, descriptor, raw)?;
        info!(
            file = %descriptor.file_name,
            family = descriptor.family.code(),
            read = out.read,
            kept = out.rows.len(),
            "Ingested player-stat file"
        );

        self.player_stat_files += 1;
        self.rows_read += out.read;
        self.exact_duplicates += out.exact_duplicates;
        self.key_duplicates += out.key_duplicates;
        self.zero_records += out.zero_records;

        let seen = self.player_keys.entry(descriptor.family).or_default();
        let before = out.rows.len();
        let fresh: Vec<_> = out.rows.into_iter().filter(|row| seen.insert(row.key())).collect();
        self.key_duplicates += before - fresh.len();
        self.facts.player_mut(descriptor.family).extend(fresh);
        Ok(())
    }

    /// Normalize one team-stat file. Closes player-stat ingestion.
    pub fn ingest_team_stat(&mut self, descriptor: &FileDescriptor, raw: RawTable) -> Result<()> {
        self.phase = Phase::TeamStats;

        let out = normalize_team_stat(&mut self.registry, descriptor, raw)?;
        info!(
            file = %descriptor.file_name,
            family = descriptor.family.code(),
            read = out.read,
            kept = out.rows.len(),
            "Ingested team-stat file"
        );

        self.team_stat_files += 1;
        self.rows_read += out.read;
        self.exact_duplicates += out.exact_duplicates;
        self.key_duplicates += out.key_duplicates;

        let seen = self.team_keys.entry(descriptor.family).or_default();
        let before = out.rows.len();
        let fresh: Vec<_> = out.rows.into_iter().filter(|row| seen.insert(row.key())).collect();
        self.key_duplicates += before - fresh.len();
        self.facts.team_mut(descriptor.family).extend(fresh);
        Ok(())
    }

    /// Read, classify and ingest one file of the given kind
    pub fn ingest_file(&mut self, kind: StatKind, path: &Path) -> Result<()> {
        let descriptor = classify(kind, path)?;
        let raw = RawTable::from_path(path)?;
        match kind {
            StatKind::Player => self.ingest_player_stat(&descriptor, raw),
            StatKind::Team => self.ingest_team_stat(&descriptor, raw),
        }
    }

    pub fn registry(&self) -> &DimensionRegistry {
        &self.registry
    }

    /// End the run: the registry is consumed and the tables handed back
    pub fn finish(self) -> (ConsolidatedTables, ConsolidationReport) {
        let tables = ConsolidatedTables {
            dimensions: self.registry.into_tables(),
            facts: self.facts,
        };

        let report = ConsolidationReport {
            started_at: self.started_at,
            finished_at: Utc::now(),
            player_stat_files: self.player_stat_files,
            team_stat_files: self.team_stat_files,
            rows_read: self.rows_read,
            exact_duplicates: self.exact_duplicates,
            key_duplicates: self.key_duplicates,
            zero_records: self.zero_records,
            table_counts: tables.table_counts(),
        };

        (tables, report)
    }
}

impl ConsolidatedTables {
    /// Row count per persisted table
    pub fn table_counts(&self) -> Vec<(String, usize)> {
        let mut counts = Vec::new();
        for kind in [StatKind::Player, StatKind::Team] {
            for family in [StatFamily::Total, StatFamily::Average] {
                counts.push((
                    kind.table_name(family).to_string(),
                    self.facts.count(kind, family),
                ));
            }
        }
        counts.push(("history".to_string(), self.dimensions.histories.len()));
        counts.push(("conference".to_string(), self.dimensions.conferences.len()));
        counts.push(("player".to_string(), self.dimensions.players.len()));
        counts.push(("team".to_string(), self.dimensions.teams.len()));
        counts
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Single entry point for a full consolidation run
pub struct Consolidator {
    config: ConsolidatorConfig,
}

impl Consolidator {
    pub fn new(config: ConsolidatorConfig) -> Self {
        Consolidator { config }
    }

    pub fn config(&self) -> &ConsolidatorConfig {
        &self.config
    }

    /// Ingest every player-stat file, then every team-stat file
    pub fn run(&self) -> Result<(ConsolidatedTables, ConsolidationReport)> {
        let directory = match &self.config.player_desc_path {
            Some(path) if path.is_file() => PlayerDirectory::from_path(path)?,
            Some(path) => {
                warn!(path = %path.display(), "Player descriptions not found, attributes stay empty");
                PlayerDirectory::empty()
            }
            None => PlayerDirectory::empty(),
        };
        let registry = DimensionRegistry::new(directory).with_history_lookup(self.history_lookup());

        info!(
            player_stat_dir = %self.config.player_stat_dir.display(),
            team_stat_dir = %self.config.team_stat_dir.display(),
            "Starting consolidation"
        );

        let mut run = Consolidation::new(registry);
        for path in discover_csv_files(&self.config.player_stat_dir)? {
            run.ingest_file(StatKind::Player, &path)?;
        }
        for path in discover_csv_files(&self.config.team_stat_dir)? {
            run.ingest_file(StatKind::Team, &path)?;
        }

        let (tables, report) = run.finish();
        info!(
            player_stat_files = report.player_stat_files,
            team_stat_files = report.team_stat_files,
            rows_read = report.rows_read,
            "Consolidation complete"
        );
        Ok((tables, report))
    }

    fn history_lookup(&self) -> HistoryLookup {
        self.config.history_lookup
    }
}

// ============================================================================
// TESTS
// ============================================================================
