// 🧹 Stat Normalizer
// Turns one raw input file into fact rows:
//   1. drop exact-duplicate records
//   2. resolve conference / team / history (and players) through the registry
//   3. keep only the fixed stat columns, in final order
//   4. drop rows sharing a business key (first occurrence wins)
//   5. player stats only: drop rows with MIN == 0 and +/- == 0
// A percentage column holding any "NN%" cell is divided by 100 as a whole;
// all-numeric percentage columns pass through.

use crate::deduplication::{dedup_by_key, dedup_exact};
use crate::error::{Error, Result};
use crate::facts::{PlayerStatRow, TeamStatRow};
use crate::parser::{FileDescriptor, RawRecord, RawTable};
use crate::registry::DimensionRegistry;
use crate::schema::{
    is_percentage_column, stat_index, StatKind, MINUTES_COLUMN, PLAYER_NAME_COLUMN,
    PLAYER_STAT_COLUMNS, PLUS_MINUS_COLUMN, TEAM_NAME_COLUMN, TEAM_STAT_COLUMNS,
};
use tracing::debug;

/// Rows produced from one file plus what was dropped on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<R> {
    pub rows: Vec<R>,
    pub read: usize,
    pub exact_duplicates: usize,
    pub key_duplicates: usize,
    pub zero_records: usize,
}

// ============================================================================
// VALUE CLEANING
// ============================================================================

/// Parse one stat cell. Blank → `None`.
///
/// `scaled` cells are percentages written as "NN%" (or bare "NN" next to
/// them): the `%` is stripped and the number divided by 100.
fn parse_cell(value: &str, scaled: bool) -> Option<f64> {
    let value = value.trim();
    let number = if scaled {
        value.strip_suffix('%').unwrap_or(value).trim()
    } else {
        value
    };
    let parsed = number.parse::<f64>().ok()?;
    Some(if scaled { parsed / 100.0 } else { parsed })
}

/// Column positions of the stat catalog inside a raw table
fn stat_positions(raw: &RawTable, catalog: &[&str]) -> Result<Vec<usize>> {
    catalog.iter().map(|c| raw.column_index(c)).collect()
}

/// Which catalog columns hold "NN%" text. Decided per column over the whole
/// file: one `%` cell puts every cell of that column on the 0-100 scale, while
/// an all-numeric column is taken as fractions already.
fn scaled_columns(records: &[RawRecord], catalog: &[&str], positions: &[usize]) -> Vec<bool> {
    catalog
        .iter()
        .zip(positions)
        .map(|(column, &pos)| {
            is_percentage_column(column)
                && records.iter().any(|r| r.get(pos).trim().ends_with('%'))
        })
        .collect()
}

fn parse_stats(
    source: &str,
    record: &RawRecord,
    catalog: &[&str],
    positions: &[usize],
    scaled: &[bool],
) -> Result<Vec<Option<f64>>> {
    catalog
        .iter()
        .zip(positions)
        .zip(scaled)
        .map(|((column, &pos), &scaled)| {
            let cell = record.get(pos);
            if cell.trim().is_empty() {
                return Ok(None);
            }
            parse_cell(cell, scaled).map(Some).ok_or_else(|| Error::InvalidValue {
                file: source.to_string(),
                row: record.line,
                column: column.to_string(),
                value: cell.to_string(),
            })
        })
        .collect()
}

// ============================================================================
// PLAYER STATS
// ============================================================================

/// Normalize one player-stat file (team comes from the file name)
pub fn normalize_player_stat(
    registry: &mut DimensionRegistry,
    descriptor: &FileDescriptor,
    raw: RawTable,
) -> Result<Normalized<PlayerStatRow>> {
    let read = raw.len();
    let player_col = raw.column_index(PLAYER_NAME_COLUMN)?;
    raw.column_index(TEAM_NAME_COLUMN)?;
    let positions = stat_positions(&raw, PLAYER_STAT_COLUMNS)?;

    let team = descriptor
        .team
        .as_deref()
        .ok_or_else(|| Error::UnrecognizedFileName {
            kind: StatKind::Player.name(),
            file: descriptor.file_name.clone(),
        })?;

    let unique = dedup_exact(raw.records);
    let exact_duplicates = unique.removed;
    let scaled = scaled_columns(&unique.kept, PLAYER_STAT_COLUMNS, &positions);

    let conference_id = registry.resolve_conference(&descriptor.conference);
    let team_id = registry.resolve_team(team);
    let hist_id = registry.resolve_history(descriptor.year, conference_id);

    let mut rows = Vec::with_capacity(unique.kept.len());
    for record in &unique.kept {
        let player_id = registry.resolve_player(record.get(player_col));
        rows.push(PlayerStatRow {
            team_id,
            hist_id,
            player_id,
            stats: parse_stats(&raw.source, record, PLAYER_STAT_COLUMNS, &positions, &scaled)?,
        });
    }

    let keyed = dedup_by_key(rows, PlayerStatRow::key);
    let before_filter = keyed.kept.len();
    let rows: Vec<PlayerStatRow> = keyed.kept.into_iter().filter(has_record).collect();
    let zero_records = before_filter - rows.len();

    debug!(
        file = %descriptor.file_name,
        read,
        exact_duplicates,
        key_duplicates = keyed.removed,
        zero_records,
        "Normalized player-stat file"
    );

    Ok(Normalized {
        rows,
        read,
        exact_duplicates,
        key_duplicates: keyed.removed,
        zero_records,
    })
}

/// A row is kept unless both minutes and plus-minus are exactly zero
fn has_record(row: &PlayerStatRow) -> bool {
    let at = |column: &str| stat_index(PLAYER_STAT_COLUMNS, column).and_then(|i| row.stats[i]);
    !(at(MINUTES_COLUMN) == Some(0.0) && at(PLUS_MINUS_COLUMN) == Some(0.0))
}

// ============================================================================
// TEAM STATS
// ============================================================================

/// Normalize one team-stat file (team comes from each row)
pub fn normalize_team_stat(
    registry: &mut DimensionRegistry,
    descriptor: &FileDescriptor,
    raw: RawTable,
) -> Result<Normalized<TeamStatRow>> {
    let read = raw.len();
    let team_col = raw.column_index(TEAM_NAME_COLUMN)?;
    let positions = stat_positions(&raw, TEAM_STAT_COLUMNS)?;

    let unique = dedup_exact(raw.records);
    let exact_duplicates = unique.removed;
    let scaled = scaled_columns(&unique.kept, TEAM_STAT_COLUMNS, &positions);

    let conference_id = registry.resolve_conference(&descriptor.conference);
    let hist_id = registry.find_history(descriptor.year, conference_id)?;

    let mut rows = Vec::with_capacity(unique.kept.len());
    for record in &unique.kept {
        let team_id = registry.resolve_team(record.get(team_col));
        rows.push(TeamStatRow {
            team_id,
            hist_id,
            stats: parse_stats(&raw.source, record, TEAM_STAT_COLUMNS, &positions, &scaled)?,
        });
    }

    let keyed = dedup_by_key(rows, TeamStatRow::key);

    debug!(
        file = %descriptor.file_name,
        read,
        exact_duplicates,
        key_duplicates = keyed.removed,
        "Normalized team-stat file"
    );

    Ok(Normalized {
        rows: keyed.kept,
        read,
        exact_duplicates,
        key_duplicates: keyed.removed,
        zero_records: 0,
    })
}

// ============================================================================
// TESTS
// ============================================================================
