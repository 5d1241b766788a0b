//! History error types

use thiserror::Error;

/// Errors that can occur while normalizing a play history
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// One entry of a file's history could not be parsed
    #[error("Failed to parse play history of file {key} ({name}): invalid entry '{value}'")]
    Parse {
        key: u64,
        name: String,
        value: String,
    },

    /// The midnight offset pushed a timestamp outside the calendar
    #[error("Play history of file {key} ({name}) is out of range after applying midnight offset")]
    OutOfRange { key: u64, name: String },

    #[error("Midnight offset of {0} minutes is out of range")]
    InvalidOffset(i64),
}

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;
