//! Per-pass outcome reporting.
//!
//! Every pass produces a [`PassReport`]: how many events were created,
//! updated, already in sync, or orphaned, and which individual operations
//! failed. A pass with per-operation failures "completed with errors" —
//! distinct from a pass aborted by a full fetch failure, which produces no
//! report at all.

use std::fmt;

use tracing::{info, warn};

use tripsync_core::EventKey;
use tripsync_providers::ProviderErrorCode;

/// The kind of write operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOperation {
    /// Creating a new event.
    Create,
    /// Patching an existing event.
    Update,
}

impl fmt::Display for ApplyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
        }
    }
}

/// A single failed create/update operation.
#[derive(Debug, Clone)]
pub struct ApplyFailure {
    /// External key of the affected flight.
    pub key: EventKey,
    /// Which operation failed.
    pub operation: ApplyOperation,
    /// Error category from the provider.
    pub code: ProviderErrorCode,
    /// Human-readable error message.
    pub message: String,
}

impl fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}: {}",
            self.operation, self.key, self.code, self.message
        )
    }
}

/// The outcome of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Events created on the target.
    pub created: usize,
    /// Events patched on the target.
    pub updated: usize,
    /// Desired events already in sync.
    pub unchanged: usize,
    /// Keys present on the target but absent upstream. Left in place.
    pub orphaned: Vec<EventKey>,
    /// Operations that failed.
    pub failures: Vec<ApplyFailure>,
}

impl PassReport {
    /// Returns true if any individual operation failed.
    pub fn completed_with_errors(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Returns the number of successful write operations.
    pub fn applied(&self) -> usize {
        self.created + self.updated
    }

    /// Emits the report through tracing: one summary line, one warning per
    /// failure, and a warning naming any orphaned keys.
    pub fn log(&self) {
        info!(
            created = self.created,
            updated = self.updated,
            unchanged = self.unchanged,
            orphaned = self.orphaned.len(),
            failed = self.failures.len(),
            "pass completed"
        );
        for failure in &self.failures {
            warn!(
                key = %failure.key,
                operation = %failure.operation,
                code = %failure.code,
                "apply operation failed: {}",
                failure.message
            );
        }
        if !self.orphaned.is_empty() {
            let keys: Vec<&str> = self.orphaned.iter().map(EventKey::as_str).collect();
            warn!(keys = ?keys, "events on calendar no longer present upstream (left in place)");
        }
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} unchanged, {} orphaned, {} failed",
            self.created,
            self.updated,
            self.unchanged,
            self.orphaned.len(),
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  failed: {}", failure)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(key: &str) -> ApplyFailure {
        ApplyFailure {
            key: EventKey::new(key),
            operation: ApplyOperation::Create,
            code: ProviderErrorCode::TargetRejected,
            message: "invalid calendar id".to_string(),
        }
    }

    #[test]
    fn clean_report() {
        let report = PassReport {
            created: 2,
            updated: 1,
            unchanged: 4,
            ..Default::default()
        };
        assert!(!report.completed_with_errors());
        assert_eq!(report.applied(), 3);
        assert_eq!(
            report.to_string(),
            "2 created, 1 updated, 4 unchanged, 0 orphaned, 0 failed"
        );
    }

    #[test]
    fn report_with_failures_enumerates_them() {
        let report = PassReport {
            created: 2,
            failures: vec![failure("AB123-2024-05-01")],
            ..Default::default()
        };
        assert!(report.completed_with_errors());

        let rendered = report.to_string();
        assert!(rendered.contains("1 failed"));
        assert!(rendered.contains("create AB123-2024-05-01: target_rejected"));
    }

    #[test]
    fn failure_display_names_key_and_kind() {
        let rendered = failure("AB123-2024-05-01").to_string();
        assert!(rendered.starts_with("create AB123-2024-05-01"));
        assert!(rendered.contains("target_rejected"));
        assert!(rendered.contains("invalid calendar id"));
    }
}
