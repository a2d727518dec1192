//! Error types for the store-data crate.

use thiserror::Error;

/// Errors that can occur while loading data or talking to a repository.
#[derive(Error, Debug)]
pub enum DataError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A JSON document couldn't be parsed
    #[error("Parse error in {file}: {reason}")]
    ParseError { file: String, reason: String },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g., review for non-existent store)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u64 },

    /// A persisted blob was written by a format version we don't understand
    #[error("Unsupported {kind} blob version {version}")]
    UnsupportedVersion { kind: &'static str, version: u32 },

    /// Blob (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing repository rejected or failed an operation
    #[error("Repository error: {0}")]
    Repository(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataError>;
