//! Calendar event types.
//!
//! This module provides the calendar-side data model:
//! - [`EventKey`]: the stable external key used to match events across passes
//! - [`CalendarEvent`]: the canonical desired-state event derived from a segment
//! - [`ObservedEvent`]: an event as currently stored on the event target
//! - [`EventPatch`]: the set of fields an update should touch
//!
//! A [`CalendarEvent`] is a value, not an entity: it is recomputed fresh on
//! every reconciliation pass and never cached. The [`ObservedEvent`] lifecycle
//! belongs entirely to the event target.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A stable external key identifying a flight across reconciliation passes.
///
/// The key is a deterministic function of the flight designator and the
/// departure date in the departure's own UTC offset, e.g. `AB123-2024-05-01`.
/// Minute-level shifts in departure or arrival estimates do not change the
/// key; the same flight number on a different day does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(String);

impl EventKey {
    /// Wraps an already-formatted key (e.g. one read back from the target).
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives the key for a flight from its designator and local departure.
    ///
    /// The date is taken in the departure's own offset, so an evening
    /// departure near midnight keys on the traveler's wall-clock date, not
    /// the UTC date.
    pub fn from_flight(
        carrier: &str,
        flight_number: &str,
        departure: &DateTime<FixedOffset>,
    ) -> Self {
        Self(format!(
            "{}{}-{}",
            carrier.trim().to_ascii_uppercase(),
            flight_number.trim(),
            departure.date_naive().format("%Y-%m-%d"),
        ))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The canonical desired-state calendar event derived from a flight segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Stable external key used for matching (see [`EventKey`]).
    pub key: EventKey,
    /// Human-readable summary, e.g. "AB123 JFK→LHR".
    pub title: String,
    /// Departure instant, original offset preserved.
    pub start: DateTime<FixedOffset>,
    /// Arrival instant, original offset preserved.
    pub end: DateTime<FixedOffset>,
    /// Route string, e.g. "JFK → LHR".
    pub location: String,
    /// Identifier of the source trip this event was derived from.
    /// Carried for traceability only; never used for matching.
    pub trip_id: String,
}

impl CalendarEvent {
    /// Computes the patch that would bring `observed` in line with `self`.
    ///
    /// Only fields that differ are set in the patch; an empty patch means the
    /// observed event already matches. Start and end compare by instant and
    /// offset, since the offset is what the target displays.
    pub fn diff(&self, observed: &ObservedEvent) -> EventPatch {
        let mut patch = EventPatch::default();

        if self.title != observed.title {
            patch.title = Some(self.title.clone());
        }
        if !same_moment(&self.start, &observed.start) {
            patch.start = Some(self.start);
        }
        if !same_moment(&self.end, &observed.end) {
            patch.end = Some(self.end);
        }
        if self.location != observed.location {
            patch.location = Some(self.location.clone());
        }

        patch
    }
}

/// Instant-and-offset equality. `DateTime` equality alone compares the
/// instant only, which would miss a pure offset change that shifts the
/// wall-clock time shown to the user.
fn same_moment(a: &DateTime<FixedOffset>, b: &DateTime<FixedOffset>) -> bool {
    a == b && a.offset() == b.offset()
}

/// An event as currently stored on the event target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedEvent {
    /// Provider-assigned opaque identifier.
    pub id: String,
    /// External key, if the event carries one. Events without a key were not
    /// created by this system and must never be touched.
    pub key: Option<EventKey>,
    /// Event summary.
    pub title: String,
    /// Start instant as stored on the target.
    pub start: DateTime<FixedOffset>,
    /// End instant as stored on the target.
    pub end: DateTime<FixedOffset>,
    /// Location string as stored on the target.
    pub location: String,
    /// Provider revision token, opaque. Carried through unmodified.
    pub etag: Option<String>,
}

impl ObservedEvent {
    /// Creates an observed event with the given identity and times.
    pub fn new(
        id: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.into(),
            key: None,
            title: String::new(),
            start,
            end,
            location: String::new(),
            etag: None,
        }
    }

    /// Builder method to set the external key.
    pub fn with_key(mut self, key: EventKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the revision token.
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Creates the observed twin of a desired event, as the target would
    /// store it after a successful create.
    pub fn from_desired(id: impl Into<String>, desired: &CalendarEvent) -> Self {
        Self {
            id: id.into(),
            key: Some(desired.key.clone()),
            title: desired.title.clone(),
            start: desired.start,
            end: desired.end,
            location: desired.location.clone(),
            etag: None,
        }
    }
}

/// The set of fields an update should touch.
///
/// `None` fields are omitted from the update request entirely, so the target
/// keeps its stored value (including any user edits to fields this system
/// does not manage).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    /// New title, if it changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New start instant, if it changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<FixedOffset>>,
    /// New end instant, if it changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<FixedOffset>>,
    /// New location, if it changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl EventPatch {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.location.is_none()
    }

    /// Returns the number of fields this patch touches.
    pub fn field_count(&self) -> usize {
        [
            self.title.is_some(),
            self.start.is_some(),
            self.end.is_some(),
            self.location.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    /// Applies this patch to an observed event, as the target would.
    pub fn apply_to(&self, observed: &mut ObservedEvent) {
        if let Some(ref title) = self.title {
            observed.title = title.clone();
        }
        if let Some(start) = self.start {
            observed.start = start;
        }
        if let Some(end) = self.end {
            observed.end = end;
        }
        if let Some(ref location) = self.location {
            observed.location = location.clone();
        }
    }
}
