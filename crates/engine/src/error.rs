//! Engine error types

use thiserror::Error;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// `start` called while running or draining
    #[error("engine already running")]
    AlreadyRunning,

    /// `shutdown` called on an engine that was never started
    #[error("engine not running")]
    NotRunning,

    /// The engine already completed its lifecycle
    #[error("engine already shut down, create a new one to restart")]
    Terminated,

    #[error("ingestion error: {0}")]
    Ingestion(#[from] ingestion::IngestionError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
