//! Error types for the deploy watcher

use thiserror::Error;

/// Main error type for the deploy watcher
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Invalid correlation key: {0}")]
    InvalidCorrelationKey(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Watch cancelled after {0:?}")]
    Cancelled(std::time::Duration),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WatchError {
    /// Errors raised by the build provider rather than by the caller
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            WatchError::ProviderUnavailable(_) | WatchError::NotFound(_) | WatchError::HttpError(_)
        )
    }
}

impl From<anyhow::Error> for WatchError {
    fn from(err: anyhow::Error) -> Self {
        WatchError::Internal(err.to_string())
    }
}
