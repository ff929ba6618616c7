//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or validated
    #[error("Failed to load configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// Listen address could not be bound
    #[error("Failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },

    /// Credential bootstrap error
    #[error("Invalid credential binding: {0}")]
    Credentials(#[from] auth::AuthError),

    /// Engine lifecycle error
    #[error("Engine error: {0}")]
    Engine(#[from] engine::EngineError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn bind(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Bind {
            addr: addr.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
