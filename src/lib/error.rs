//! Error types for trial record ingestion and parsing.

use thiserror::Error;

/// Failure to parse a single input row. Rows failing this way are dropped.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: u64, reason: String },
}

/// The record source could not be read at all.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Could not open trial data {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
