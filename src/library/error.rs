//! Library error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a library snapshot
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Failed to read library snapshot {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Failed to parse library snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Library snapshot must be a JSON array of file objects")]
    NotAnArray,

    #[error("File #{index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("File #{index} is missing field '{field}'")]
    MissingField { index: usize, field: String },

    #[error("File #{index} has invalid value '{value}' for field '{field}'")]
    InvalidField {
        index: usize,
        field: String,
        value: String,
    },
}

/// Result type for library operations
pub type LibraryResult<T> = Result<T, LibraryError>;
