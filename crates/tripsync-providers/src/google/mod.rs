//! Google Calendar event target.
//!
//! Talks to the Calendar v3 REST API with service-account credentials. The
//! reconciliation key is stored on each created event as a private extended
//! property, which is how the system recognizes its own events on later
//! passes.

mod auth;
mod client;
mod config;
mod provider;

pub use auth::TokenProvider;
pub use client::{EXTENDED_PROPERTY_KEY, GoogleCalendarClient};
pub use config::{CALENDAR_SCOPE, GoogleConfig, ServiceAccountKey};
pub use provider::GoogleCalendarTarget;
