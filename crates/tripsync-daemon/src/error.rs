//! Daemon error types.

use thiserror::Error;

use tripsync_providers::ProviderError;

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;

/// Errors that can occur while running the daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// A full fetch (trip list or observed event set) failed. The pass is
    /// aborted without computing partial state; the next tick retries.
    #[error("pass aborted: {0}")]
    Fetch(#[from] ProviderError),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl DaemonError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
