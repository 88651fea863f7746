// Error taxonomy for consolidation and reconstruction
//
// Input-format problems, ordering mistakes and storage failures are all fatal.
// Reference-data gaps (unknown players) are NOT errors: they never reach here.

use thiserror::Error;

/// Result type used across the library
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// File name does not match the expected `<year>_<conf>[_<team>]_<AVG|TOT>` pattern
    #[error("Unrecognized {kind} file name: {file}")]
    UnrecognizedFileName { kind: &'static str, file: String },

    /// A required raw column is absent from an input file
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A stat cell is neither numeric nor a `NN%` percentage
    #[error("Invalid value '{value}' in {file} row {row}, column '{column}'")]
    InvalidValue {
        file: String,
        row: usize,
        column: String,
        value: String,
    },

    /// Strict history lookup found no (year, conference) row
    #[error("No history row for year {year}, conference id {conference_id}")]
    UnknownHistory { year: i32, conference_id: i64 },

    /// Player-stat and team-stat ingestion were interleaved
    #[error("Ingestion order violated: {0}")]
    OutOfOrder(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors caused by malformed input files
    pub fn is_input_format(&self) -> bool {
        matches!(
            self,
            Error::UnrecognizedFileName { .. }
                | Error::MissingColumn { .. }
                | Error::InvalidValue { .. }
        )
    }
}
