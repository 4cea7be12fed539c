//! Error types for alm-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in alm-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document text could not be decoded
    #[error("malformed input '{source_name}': {message}")]
    MalformedInput { source_name: String, message: String },

    /// CSV writing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Document produced no scenarios to export
    #[error("no scenarios found in '{}'", .0.display())]
    NoScenarios(PathBuf),

    /// Sheet name cannot be used as a file name
    #[error("invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Config values outside their allowed range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Two features would be exported into the same directory
    #[error("'{}' would overwrite the export of '{}' in '{}'", .path.display(), .existing.display(), .output_dir.display())]
    OutputCollision {
        path: PathBuf,
        existing: PathBuf,
        output_dir: PathBuf,
    },

    /// Unsupported output format name
    #[error("unknown output format '{0}', expected csv or json")]
    UnknownFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
