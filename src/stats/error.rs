//! Evaluation error types

use thiserror::Error;

/// Errors that can occur while computing or applying statistics
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// A token reached computation without being resolved for this run
    #[error("Token [{0}] was not resolved for this run")]
    UnknownToken(String),

    /// A series token cannot order a playlist
    #[error("Playlist '{playlist}' cannot be ordered by series token [{token}]")]
    NotSortable { playlist: String, token: String },
}

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvaluationError>;
