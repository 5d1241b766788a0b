//! Token error types
//!
//! Defines all error conditions that can occur while parsing and resolving
//! template tokens.

use thiserror::Error;

/// Errors that can occur during token operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token text does not match any known form
    #[error("Unknown token: [{0}]")]
    Unknown(String),

    /// Token text is empty
    #[error("Empty token")]
    Empty,

    /// Token matched a form but a value is out of range
    #[error("Invalid value in [{token}]: {reason}")]
    OutOfRange { token: String, reason: String },

    /// A fixed keyword carried a value it does not accept
    #[error("Token [{0}] does not accept a value")]
    UnexpectedValue(String),

    /// A resolved window would be empty or overflow the calendar
    #[error("Invalid time window in [{0}]")]
    InvalidWindow(String),

    /// One or more tokens of the run failed to parse
    #[error("Invalid tokens in configuration: {}", format_invalid(.0))]
    Invalid(Vec<TokenError>),
}

fn format_invalid(errors: &[TokenError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;
