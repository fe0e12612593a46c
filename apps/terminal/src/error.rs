//! Error types for the terminal client.

use thiserror::Error;

/// Errors talking to the result store backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Not authenticated - please register first")]
    NotAuthenticated,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Credential store error: {0}")]
    Credentials(String),
}

/// Errors reading configuration from the environment.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
