use std::result::Result as StdResult;

use thiserror::Error;

/// Unified error type for schema, configuration, and engine plumbing.
#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Persistence error: {0}")]
    StorageError(String),
}

pub type Result<T> = StdResult<T, ClaimsError>;

impl From<std::io::Error> for ClaimsError {
    fn from(err: std::io::Error) -> Self {
        ClaimsError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for ClaimsError {
    fn from(err: serde_json::Error) -> Self {
        ClaimsError::ConfigError(err.to_string())
    }
}
