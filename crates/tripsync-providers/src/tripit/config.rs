//! TripIt provider configuration.

use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

/// Default base URL for the TripIt API.
pub const DEFAULT_BASE_URL: &str = "https://api.tripit.com";

/// Configuration for the TripIt itinerary source.
#[derive(Debug, Clone)]
pub struct TripItConfig {
    /// TripIt account username.
    pub username: String,
    /// TripIt API token (used as the Basic auth password).
    pub token: String,
    /// API base URL. Overridable for tests.
    pub base_url: String,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl TripItConfig {
    /// Creates a configuration with the given credentials.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Builder method to override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks that the credentials are present.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.username.trim().is_empty() {
            return Err(ProviderError::configuration("tripit username is empty")
                .with_provider("tripit"));
        }
        if self.token.trim().is_empty() {
            return Err(
                ProviderError::configuration("tripit token is empty").with_provider("tripit")
            );
        }
        Ok(())
    }
}
