// 🏗️ Input parsing
// File-name classification, directory discovery and raw CSV loading

use crate::error::{Error, Result};
use crate::schema::{StatFamily, StatKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

// ============================================================================
// FILE NAME CLASSIFICATION
// ============================================================================

static PLAYER_STAT_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})_([A-Z]+)_([A-Z]+)_(AVG|TOT)").expect("valid regex"));

static TEAM_STAT_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})_([A-Z]+)_(AVG|TOT)").expect("valid regex"));

/// Context encoded in an input file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub kind: StatKind,
    pub year: i32,
    pub conference: String,
    /// Only player-stat files name their team; team-stat files carry it per row
    pub team: Option<String>,
    pub family: StatFamily,
    pub file_name: String,
}

/// Classify a player-stat file: `<year>_<conf>_<team>_<AVG|TOT>`
///
/// # Examples:
/// ```
/// use pba_stats::parser::classify_player_stat_file;
/// use std::path::Path;
/// let d = classify_player_stat_file(Path::new("2021_PH_AA_TOT.csv")).unwrap();
/// assert_eq!(d.team.as_deref(), Some("AA"));
/// ```
pub fn classify_player_stat_file(path: &Path) -> Result<FileDescriptor> {
    let file_name = file_name_of(path);
    let unrecognized = || Error::UnrecognizedFileName {
        kind: StatKind::Player.name(),
        file: file_name.clone(),
    };

    let caps = PLAYER_STAT_FILE
        .captures(&file_name)
        .ok_or_else(unrecognized)?;

    let year = caps[1].parse::<i32>().map_err(|_| unrecognized())?;
    let family = StatFamily::from_code(&caps[4]).ok_or_else(unrecognized)?;

    Ok(FileDescriptor {
        kind: StatKind::Player,
        year,
        conference: caps[2].to_string(),
        team: Some(caps[3].to_string()),
        family,
        file_name: file_name.clone(),
    })
}

/// Classify a team-stat file: `<year>_<conf>_<AVG|TOT>`
pub fn classify_team_stat_file(path: &Path) -> Result<FileDescriptor> {
    let file_name = file_name_of(path);
    let unrecognized = || Error::UnrecognizedFileName {
        kind: StatKind::Team.name(),
        file: file_name.clone(),
    };

    let caps = TEAM_STAT_FILE.captures(&file_name).ok_or_else(unrecognized)?;

    let year = caps[1].parse::<i32>().map_err(|_| unrecognized())?;
    let family = StatFamily::from_code(&caps[3]).ok_or_else(unrecognized)?;

    Ok(FileDescriptor {
        kind: StatKind::Team,
        year,
        conference: caps[2].to_string(),
        team: None,
        family,
        file_name: file_name.clone(),
    })
}

/// Classify a file for the given stat kind
pub fn classify(kind: StatKind, path: &Path) -> Result<FileDescriptor> {
    match kind {
        StatKind::Player => classify_player_stat_file(path),
        StatKind::Team => classify_team_stat_file(path),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string()
}

// ============================================================================
// DISCOVERY
// ============================================================================

/// CSV files of a directory, sorted by file name so ids are reproducible
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if is_csv {
            files.push(path);
        } else {
            warn!(path = %path.display(), "Skipping non-CSV file");
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

// ============================================================================
// RAW TABLES
// ============================================================================

/// One data row and the file line it came from (header = line 1).
///
/// Equality and hashing look at `values` only, so two identical rows on
/// different lines are exact duplicates.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub line: usize,
    pub values: Vec<String>,
}

impl RawRecord {
    pub fn get(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }
}

impl PartialEq for RawRecord {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for RawRecord {}

impl Hash for RawRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.hash(state);
    }
}

/// One input file as read: header names plus string records
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub source: String,
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(source: impl Into<String>, headers: Vec<String>, records: Vec<RawRecord>) -> Self {
        RawTable {
            source: source.into(),
            headers,
            records,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file_name_of(path), file)
    }

    pub fn from_reader<R: Read>(source: impl Into<String>, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = rdr.headers()?.iter().map(str::to_string).collect();

        let mut records = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            records.push(RawRecord {
                line: i + 2,
                values: record.iter().map(str::to_string).collect(),
            });
        }

        Ok(RawTable::new(source, headers, records))
    }

    /// Index of a required column
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| Error::MissingColumn {
                file: self.source.clone(),
                column: column.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
