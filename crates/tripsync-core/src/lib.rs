//! Core types: trips, flight segments, calendar events, reconciliation

pub mod event;
pub mod normalize;
pub mod reconcile;
pub mod tracing;
pub mod trip;

pub use event::{CalendarEvent, EventKey, EventPatch, ObservedEvent};
pub use normalize::{normalize, normalize_trips};
pub use reconcile::{ReconcilePlan, UpdateOp, reconcile};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use trip::{FlightSegment, SegmentStatus, Trip};
