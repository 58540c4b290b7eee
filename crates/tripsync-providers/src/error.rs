//! Error types for provider operations.
//!
//! Both collaborators — the itinerary source and the event target — report
//! failures through [`ProviderError`], categorized by [`ProviderErrorCode`].

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The itinerary source could not be reached or refused our credentials.
    SourceUnavailable,
    /// The itinerary source answered with something we could not parse.
    SourceMalformed,
    /// The event target could not be reached (network, 5xx, rate limit).
    TargetUnavailable,
    /// The event target rejected the request (bad calendar id, auth, 4xx).
    TargetRejected,
    /// Missing or invalid local configuration (credentials, keyfile).
    ConfigurationError,
}

impl ProviderErrorCode {
    /// Returns true if the failure is transient and the next scheduled pass
    /// may succeed without operator intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SourceUnavailable | Self::TargetUnavailable)
    }

    /// Returns a stable snake_case name for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceUnavailable => "source_unavailable",
            Self::SourceMalformed => "source_malformed",
            Self::TargetUnavailable => "target_unavailable",
            Self::TargetRejected => "target_rejected",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from the itinerary source or the event target.
#[derive(Debug, Error)]
pub struct ProviderError {
    /// The error code categorizing this error.
    code: ProviderErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The provider that generated this error (e.g., "tripit", "google").
    provider: Option<String>,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    /// Creates a source-unavailable error.
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::SourceUnavailable, message)
    }

    /// Creates a source-malformed error.
    pub fn source_malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::SourceMalformed, message)
    }

    /// Creates a target-unavailable error.
    pub fn target_unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::TargetUnavailable, message)
    }

    /// Creates a target-rejected error.
    pub fn target_rejected(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::TargetRejected, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider name, if set.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
