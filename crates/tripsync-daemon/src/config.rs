//! Daemon configuration.

use std::time::Duration;

use crate::error::{DaemonError, DaemonResult};

/// Configuration for the sync daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Target calendar identifier.
    pub calendar_id: String,

    /// Interval between reconciliation passes.
    pub poll_interval: Duration,

    /// Run a single pass and exit instead of looping.
    pub run_once: bool,

    /// Also mirror trips that lie entirely in the past.
    pub include_past: bool,

    /// Keep cancelled segments in the fetched trips. They are still skipped
    /// by normalization; this only affects what the source reports.
    pub include_cancelled: bool,

    /// Maximum number of concurrent create/update operations per pass.
    pub apply_concurrency: usize,
}

impl DaemonConfig {
    /// Creates a configuration for the given calendar with defaults.
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            poll_interval: Duration::from_secs(60),
            run_once: false,
            include_past: false,
            include_cancelled: false,
            apply_concurrency: 4,
        }
    }

    /// Builder: set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builder: set run-once mode.
    pub fn with_run_once(mut self, run_once: bool) -> Self {
        self.run_once = run_once;
        self
    }

    /// Builder: include past trips.
    pub fn with_include_past(mut self, include_past: bool) -> Self {
        self.include_past = include_past;
        self
    }

    /// Builder: set the apply concurrency bound.
    pub fn with_apply_concurrency(mut self, concurrency: usize) -> Self {
        self.apply_concurrency = concurrency;
        self
    }

    /// Checks the configuration for values the daemon cannot run with.
    pub fn validate(&self) -> DaemonResult<()> {
        if self.calendar_id.trim().is_empty() {
            return Err(DaemonError::config("calendar id is empty"));
        }
        if self.poll_interval.is_zero() {
            return Err(DaemonError::config("poll interval must be non-zero"));
        }
        if self.apply_concurrency == 0 {
            return Err(DaemonError::config("apply concurrency must be at least 1"));
        }
        Ok(())
    }
}
