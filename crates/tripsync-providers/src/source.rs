//! ItinerarySource trait definition.
//!
//! The itinerary source is the read-only side of the sync: it supplies the
//! trips (and their flight segments) the calendar should mirror.

use std::future::Future;
use std::pin::Pin;

use tripsync_core::Trip;

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Boxing keeps the traits object-safe, so the daemon can hold
/// `Arc<dyn ItinerarySource>` / `Arc<dyn EventTarget>` without generics
/// leaking through the whole call stack.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Filter options for listing trips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TripFilter {
    /// Include trips that lie entirely in the past.
    pub include_past: bool,
    /// Include segments whose status is cancelled.
    pub include_cancelled: bool,
}

impl TripFilter {
    /// Creates a filter with defaults (upcoming trips, no cancelled segments).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to include past trips.
    pub fn with_past(mut self, include_past: bool) -> Self {
        self.include_past = include_past;
        self
    }

    /// Builder method to include cancelled segments.
    pub fn with_cancelled(mut self, include_cancelled: bool) -> Self {
        self.include_cancelled = include_cancelled;
        self
    }
}

/// The abstraction over trip-management services.
///
/// Implementations are read-only consumers of the upstream service. They
/// must map transport and authentication failures to
/// `ProviderErrorCode::SourceUnavailable` and unparseable responses to
/// `ProviderErrorCode::SourceMalformed`, so the daemon can decide whether a
/// failed pass is worth waiting out.
pub trait ItinerarySource: Send + Sync {
    /// Returns the name of this source (e.g., "tripit").
    fn name(&self) -> &str;

    /// Fetches the current trip list with all flight segments.
    ///
    /// The returned trips are a complete snapshot; the caller never merges
    /// them with a previous fetch.
    fn list_trips(&self, filter: TripFilter) -> BoxFuture<'_, ProviderResult<Vec<Trip>>>;
}
