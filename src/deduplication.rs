// 🔍 Deduplication passes
// Two strategies, both keep the FIRST occurrence and preserve input order:
// - Exact: whole-row equality (raw records before any resolution)
// - Business key: rows sharing a key are collapsed even if metrics differ

use std::collections::HashSet;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Every column identical
    ExactMatch,

    /// Same (team_id, hist_id[, player_id])
    BusinessKey,
}

/// Outcome of one pass
#[derive(Debug, Clone, PartialEq)]
pub struct Deduplicated<T> {
    pub kept: Vec<T>,
    pub removed: usize,
    pub strategy: MatchStrategy,
}

/// Drop rows that are exact duplicates of an earlier row
pub fn dedup_exact<T: Hash + Eq + Clone>(rows: Vec<T>) -> Deduplicated<T> {
    let total = rows.len();
    let mut seen: HashSet<T> = HashSet::with_capacity(total);
    let kept: Vec<T> = rows
        .into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect();

    Deduplicated {
        removed: total - kept.len(),
        kept,
        strategy: MatchStrategy::ExactMatch,
    }
}

/// Drop rows whose key was already produced by an earlier row
pub fn dedup_by_key<T, K, F>(rows: Vec<T>, key: F) -> Deduplicated<T>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let total = rows.len();
    let mut seen: HashSet<K> = HashSet::with_capacity(total);
    let kept: Vec<T> = rows.into_iter().filter(|row| seen.insert(key(row))).collect();

    Deduplicated {
        removed: total - kept.len(),
        kept,
        strategy: MatchStrategy::BusinessKey,
    }
}
