//! Error types for sqlwarden.
//!
//! Validation itself never fails: every problem found in a query is a
//! [`Finding`](crate::finding::Finding) inside the report. These errors cover
//! the surface around the engine: loading configuration and decoding
//! caller input.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for sqlwarden operations.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Configuration file could not be parsed.
    #[error("Configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Parameters could not be decoded from JSON.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Unknown finding code in configuration or on the command line.
    #[error("Unknown finding code: '{0}'")]
    UnknownCode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WardenError {
    /// Create a configuration error for the given file.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for sqlwarden operations.
pub type WardenResult<T> = Result<T, WardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WardenError::config("sqlwarden.toml", "expected a boolean");
        assert_eq!(
            err.to_string(),
            "Configuration error in sqlwarden.toml: expected a boolean"
        );
    }

    #[test]
    fn test_unknown_code_display() {
        let err = WardenError::UnknownCode("NOPE".to_string());
        assert_eq!(err.to_string(), "Unknown finding code: 'NOPE'");
    }
}
