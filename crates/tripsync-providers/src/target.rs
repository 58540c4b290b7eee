//! EventTarget trait definition.
//!
//! The event target is the mutable side of the sync: a calendar exposing a
//! queryable set of events plus create/update operations. Deletion is
//! deliberately absent from this interface — see the reconciler's orphan
//! reporting.

use chrono::{DateTime, Utc};
use tripsync_core::{CalendarEvent, EventPatch, ObservedEvent};

use crate::error::ProviderResult;
use crate::source::BoxFuture;

/// The abstraction over calendar services.
///
/// Implementations must map transport-level failures to
/// `ProviderErrorCode::TargetUnavailable` and request-level rejections
/// (invalid calendar id, auth, validation) to
/// `ProviderErrorCode::TargetRejected`.
///
/// Each write targets a distinct external key, so creates and updates are
/// commutative with each other; callers may issue them concurrently.
pub trait EventTarget: Send + Sync {
    /// Returns the name of this target (e.g., "google").
    fn name(&self) -> &str;

    /// Lists events on the calendar starting at or after `from`.
    ///
    /// Events the target cannot express in the observed model (e.g. all-day
    /// entries) may be omitted; they can never have been created by this
    /// system.
    fn list_events(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
    ) -> BoxFuture<'_, ProviderResult<Vec<ObservedEvent>>>;

    /// Creates a new event carrying the desired event's external key.
    fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> BoxFuture<'_, ProviderResult<ObservedEvent>>;

    /// Patches an existing event, touching only the fields set in `patch`.
    fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> BoxFuture<'_, ProviderResult<ObservedEvent>>;
}
