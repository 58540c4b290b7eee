//! FlightSegment to CalendarEvent conversion.
//!
//! The normalization step turns itinerary-side [`FlightSegment`] values into
//! canonical desired-state [`CalendarEvent`] values. It is pure and total:
//! degenerate input (cancelled segments, missing instants, blank airport
//! codes) degrades to "skip", never to an error, because partial itinerary
//! data is expected and must not halt a pass.

use std::collections::HashSet;

use tracing::debug;

use crate::event::{CalendarEvent, EventKey};
use crate::trip::{FlightSegment, Trip};

/// Converts a flight segment into its desired calendar event.
///
/// Returns `None` (skip) when:
/// - the segment status is cancelled
/// - the departure or arrival instant is absent
/// - either airport code is blank
/// - the instants are inverted (arrival not after departure)
pub fn normalize(segment: &FlightSegment, trip: &Trip) -> Option<CalendarEvent> {
    if segment.status.is_cancelled() {
        return None;
    }

    let departure = segment.departure?;
    let arrival = segment.arrival?;

    let origin = segment.origin.trim();
    let destination = segment.destination.trim();
    if origin.is_empty() || destination.is_empty() {
        return None;
    }

    if departure >= arrival {
        debug!(
            designator = %segment.designator(),
            "segment has inverted times, skipping"
        );
        return None;
    }

    Some(CalendarEvent {
        key: EventKey::from_flight(&segment.marketing_airline, &segment.flight_number, &departure),
        title: format!("{} {}→{}", segment.designator(), origin, destination),
        start: departure,
        end: arrival,
        location: format!("{} → {}", origin, destination),
        trip_id: trip.id.clone(),
    })
}

/// Normalizes every segment of every trip into the desired-state event set.
///
/// Unplaceable segments are skipped. When two segments map to the same key
/// (e.g. the source reissued a trip containing the same physical flight),
/// the first occurrence wins so the reconciler input is a true keyed set.
pub fn normalize_trips(trips: &[Trip]) -> Vec<CalendarEvent> {
    let mut seen_keys = HashSet::new();
    let mut desired = Vec::new();

    for trip in trips {
        for segment in &trip.segments {
            let Some(event) = normalize(segment, trip) else {
                continue;
            };
            if seen_keys.insert(event.key.clone()) {
                desired.push(event);
            } else {
                debug!(key = %event.key, trip_id = %trip.id, "duplicate desired key, skipping");
            }
        }
    }

    desired
}
