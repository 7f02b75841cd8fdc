//! Error types for the simmer generation orchestrator.

use std::path::PathBuf;
use thiserror::Error;

/// Artifact persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize artifacts: {0}")]
    Serialization(String),

    #[error("Artifact collection at {path:?} is unreadable: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Errors surfaced by every public operation of the crate.
///
/// A job's failure is always delivered through that job's own result channel;
/// none of these variants stop the scheduler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Content parse error: {0}")]
    ContentParseError(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Backend authentication failed: {0}")]
    BackendAuthFailed(String),

    #[error("Backend rate limit exceeded: {0}")]
    BackendRateLimit(String),

    #[error("Timed out: {0}")]
    TimeoutError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Job cancelled: {0}")]
    JobCancelled(String),

    #[error("Scheduler unavailable: {0}")]
    SchedulerUnavailable(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

impl ApiError {
    /// True for every outright backend call failure (transport, auth, rate limit).
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            ApiError::BackendError(_)
                | ApiError::BackendAuthFailed(_)
                | ApiError::BackendRateLimit(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::TimeoutError(_))
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
