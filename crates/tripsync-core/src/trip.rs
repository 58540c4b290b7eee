//! Trip and flight segment types.
//!
//! This module provides the itinerary-side data model:
//! - [`Trip`]: a trip as reported by the itinerary source
//! - [`FlightSegment`]: a single flight leg within a trip
//! - [`SegmentStatus`]: the scheduling status of a segment
//!
//! Trips and segments are ephemeral values, re-fetched from the itinerary
//! source on every reconciliation pass. Nothing here is persisted locally.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// The scheduling status of a flight segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    /// The flight is scheduled to operate (includes on-time, delayed, in-flight).
    Scheduled,
    /// The flight was cancelled.
    Cancelled,
    /// The source did not report a recognizable status.
    #[default]
    Unknown,
}

impl SegmentStatus {
    /// Maps a TripIt-style numeric flight status code to a status.
    ///
    /// Codes in the 3xx range mean some flavor of "operating as scheduled"
    /// (scheduled, on time, delayed, in flight, arrived). 400 is cancelled.
    /// Everything else (not monitorable, not monitored, unknown codes) maps
    /// to [`SegmentStatus::Unknown`].
    pub fn from_code(code: u32) -> Self {
        match code {
            300..=399 => Self::Scheduled,
            400 => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    /// Returns true if this status means the segment will not operate.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A single flight leg within a trip.
///
/// Departure and arrival instants carry the UTC offset the source reported
/// them with; they are never normalized to UTC, since the traveler reasons
/// in local airport time. Either instant may be absent when the source has
/// incomplete data for the segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSegment {
    /// Marketing carrier code (e.g., "AB").
    pub marketing_airline: String,
    /// Flight number, without the carrier prefix (e.g., "123").
    pub flight_number: String,
    /// Origin airport IATA code.
    pub origin: String,
    /// Destination airport IATA code.
    pub destination: String,
    /// Scheduled departure, with the origin's UTC offset.
    pub departure: Option<DateTime<FixedOffset>>,
    /// Scheduled arrival, with the destination's UTC offset.
    pub arrival: Option<DateTime<FixedOffset>>,
    /// Scheduling status of this segment.
    pub status: SegmentStatus,
}

impl FlightSegment {
    /// Creates a new segment with the given flight designator and route.
    pub fn new(
        marketing_airline: impl Into<String>,
        flight_number: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            marketing_airline: marketing_airline.into(),
            flight_number: flight_number.into(),
            origin: origin.into(),
            destination: destination.into(),
            departure: None,
            arrival: None,
            status: SegmentStatus::Unknown,
        }
    }

    /// Builder method to set the departure instant.
    pub fn with_departure(mut self, departure: DateTime<FixedOffset>) -> Self {
        self.departure = Some(departure);
        self
    }

    /// Builder method to set the arrival instant.
    pub fn with_arrival(mut self, arrival: DateTime<FixedOffset>) -> Self {
        self.arrival = Some(arrival);
        self
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: SegmentStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns the flight designator, e.g. "AB123".
    pub fn designator(&self) -> String {
        format!("{}{}", self.marketing_airline.trim(), self.flight_number.trim())
    }

    /// Returns true if both departure and arrival instants are present.
    pub fn has_times(&self) -> bool {
        self.departure.is_some() && self.arrival.is_some()
    }
}

/// A trip as reported by the itinerary source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Source-assigned unique identifier.
    pub id: String,
    /// Human-readable trip name (e.g., "London, May 2024").
    pub display_name: String,
    /// Whether the trip lies entirely in the past.
    pub is_past: bool,
    /// Flight segments, in itinerary order.
    pub segments: Vec<FlightSegment>,
}

impl Trip {
    /// Creates a new trip with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            is_past: false,
            segments: Vec::new(),
        }
    }

    /// Builder method to set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Builder method to mark the trip as past.
    pub fn with_past(mut self, is_past: bool) -> Self {
        self.is_past = is_past;
        self
    }

    /// Builder method to add a segment.
    pub fn with_segment(mut self, segment: FlightSegment) -> Self {
        self.segments.push(segment);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn eastern(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::west_opt(4 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
    }

    mod segment_status {
        use super::*;

        #[test]
        fn code_mapping() {
            assert_eq!(SegmentStatus::from_code(300), SegmentStatus::Scheduled);
            assert_eq!(SegmentStatus::from_code(301), SegmentStatus::Scheduled);
            assert_eq!(SegmentStatus::from_code(303), SegmentStatus::Scheduled);
            assert_eq!(SegmentStatus::from_code(400), SegmentStatus::Cancelled);
            assert_eq!(SegmentStatus::from_code(100), SegmentStatus::Unknown);
            assert_eq!(SegmentStatus::from_code(200), SegmentStatus::Unknown);
            assert_eq!(SegmentStatus::from_code(0), SegmentStatus::Unknown);
        }

        #[test]
        fn cancelled_check() {
            assert!(SegmentStatus::Cancelled.is_cancelled());
            assert!(!SegmentStatus::Scheduled.is_cancelled());
            assert!(!SegmentStatus::Unknown.is_cancelled());
        }
    }

    mod flight_segment {
        use super::*;

        #[test]
        fn basic_creation() {
            let segment = FlightSegment::new("AB", "123", "JFK", "LHR");
            assert_eq!(segment.designator(), "AB123");
            assert_eq!(segment.status, SegmentStatus::Unknown);
            assert!(!segment.has_times());
        }

        #[test]
        fn builder_pattern() {
            let segment = FlightSegment::new("AB", "123", "JFK", "LHR")
                .with_departure(eastern(2024, 5, 1, 18, 0))
                .with_arrival(eastern(2024, 5, 2, 1, 0))
                .with_status(SegmentStatus::Scheduled);

            assert!(segment.has_times());
            assert_eq!(segment.status, SegmentStatus::Scheduled);
        }

        #[test]
        fn designator_trims_whitespace() {
            let segment = FlightSegment::new(" AB ", " 123", "JFK", "LHR");
            assert_eq!(segment.designator(), "AB123");
        }

        #[test]
        fn serde_roundtrip_preserves_offset() {
            let segment = FlightSegment::new("AB", "123", "JFK", "LHR")
                .with_departure(eastern(2024, 5, 1, 18, 0));

            let json = serde_json::to_string(&segment).unwrap();
            assert!(json.contains("-04:00"));
            let parsed: FlightSegment = serde_json::from_str(&json).unwrap();
            assert_eq!(segment, parsed);
        }
    }

    mod trip {
        use super::*;

        #[test]
        fn builder_pattern() {
            let trip = Trip::new("trip-1")
                .with_display_name("London, May 2024")
                .with_past(false)
                .with_segment(FlightSegment::new("AB", "123", "JFK", "LHR"))
                .with_segment(FlightSegment::new("AB", "124", "LHR", "JFK"));

            assert_eq!(trip.id, "trip-1");
            assert_eq!(trip.display_name, "London, May 2024");
            assert_eq!(trip.segments.len(), 2);
            assert!(!trip.is_past);
        }
    }
}
