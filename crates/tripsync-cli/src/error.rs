//! CLI error types.

use std::fmt;

/// Result type for CLI operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Provider error (TripIt or Google Calendar).
    Provider(String),
    /// Daemon error.
    Daemon(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(msg) => write!(f, "provider error: {}", msg),
            Self::Daemon(msg) => write!(f, "daemon error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<tripsync_providers::ProviderError> for ClientError {
    fn from(err: tripsync_providers::ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

impl From<tripsync_daemon::DaemonError> for ClientError {
    fn from(err: tripsync_daemon::DaemonError) -> Self {
        Self::Daemon(err.to_string())
    }
}
