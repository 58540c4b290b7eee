//! Google Calendar implementation of [`EventTarget`].

use chrono::{DateTime, Utc};
use tripsync_core::{CalendarEvent, EventPatch, ObservedEvent};

use crate::error::ProviderResult;
use crate::google::client::GoogleCalendarClient;
use crate::google::config::GoogleConfig;
use crate::source::BoxFuture;
use crate::target::EventTarget;

/// The Google Calendar event target.
#[derive(Debug)]
pub struct GoogleCalendarTarget {
    client: GoogleCalendarClient,
}

impl GoogleCalendarTarget {
    /// Creates a target from the given configuration.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        Ok(Self {
            client: GoogleCalendarClient::new(config)?,
        })
    }
}

impl EventTarget for GoogleCalendarTarget {
    fn name(&self) -> &str {
        "google"
    }

    fn list_events(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
    ) -> BoxFuture<'_, ProviderResult<Vec<ObservedEvent>>> {
        let calendar_id = calendar_id.to_string();
        Box::pin(async move { self.client.list_events(&calendar_id, from).await })
    }

    fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> BoxFuture<'_, ProviderResult<ObservedEvent>> {
        let calendar_id = calendar_id.to_string();
        let event = event.clone();
        Box::pin(async move { self.client.create_event(&calendar_id, &event).await })
    }

    fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> BoxFuture<'_, ProviderResult<ObservedEvent>> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        let patch = patch.clone();
        Box::pin(async move {
            self.client
                .patch_event(&calendar_id, &event_id, &patch)
                .await
        })
    }
}
