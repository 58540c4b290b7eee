//! Google Calendar API client.
//!
//! Low-level HTTP client for the Calendar v3 REST API: request building,
//! bearer authentication, pagination, and conversion between the wire event
//! shape and the core [`ObservedEvent`] model.
//!
//! The reconciliation key travels in `extendedProperties.private`, so events
//! created by hand never carry one and are invisible to the reconciler.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tripsync_core::{CalendarEvent, EventKey, EventPatch, ObservedEvent};

use crate::error::{ProviderError, ProviderResult};
use crate::google::auth::TokenProvider;
use crate::google::config::GoogleConfig;

/// Name of the private extended property holding the external key.
pub const EXTENDED_PROPERTY_KEY: &str = "tripsyncKey";

/// Page size for event listing.
const LIST_PAGE_SIZE: usize = 250;

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    tokens: TokenProvider,
    base_url: String,
}

impl GoogleCalendarClient {
    /// Creates a client from the given configuration.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.key.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration("failed to create HTTP client")
                    .with_provider("google")
                    .with_source(e)
            })?;

        let tokens = TokenProvider::new(http_client.clone(), config.key, config.scope);

        Ok(Self {
            http_client,
            tokens,
            base_url: config.base_url,
        })
    }

    /// Lists events starting at or after `time_min`, following pagination.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
    ) -> ProviderResult<Vec<ObservedEvent>> {
        let token = self.tokens.access_token().await?;
        let url = self.events_url(calendar_id);

        let mut observed = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http_client
                .get(&url)
                .bearer_auth(&token)
                .query(&[
                    ("timeMin", time_min.to_rfc3339()),
                    ("singleEvents", "true".to_string()),
                    ("maxResults", LIST_PAGE_SIZE.to_string()),
                ]);

            if let Some(ref next) = page_token {
                request = request.query(&[("pageToken", next.as_str())]);
            }

            let response = request.send().await.map_err(transport_error)?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(status_error(status, &body));
            }

            let body = response.text().await.map_err(transport_error)?;
            let page: EventListResponse = serde_json::from_str(&body).map_err(|e| {
                ProviderError::target_unavailable(format!("failed to parse event list: {}", e))
                    .with_provider("google")
            })?;

            for item in page.items {
                if let Some(event) = convert_event(item) {
                    observed.push(event);
                }
            }

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(count = observed.len(), calendar = calendar_id, "fetched events");
        Ok(observed)
    }

    /// Creates a new event carrying the desired event's external key.
    pub async fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> ProviderResult<ObservedEvent> {
        let token = self.tokens.access_token().await?;
        let url = self.events_url(calendar_id);
        let body = ApiEventWrite::from_desired(event);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        self.read_event_response(response).await
    }

    /// Patches an existing event, sending only the fields set in `patch`.
    pub async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> ProviderResult<ObservedEvent> {
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        );
        let body = ApiEventWrite::from_patch(patch);

        let response = self
            .http_client
            .patch(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        self.read_event_response(response).await
    }

    async fn read_event_response(
        &self,
        response: reqwest::Response,
    ) -> ProviderResult<ObservedEvent> {
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let api_event: ApiEvent = serde_json::from_str(&body).map_err(|e| {
            ProviderError::target_unavailable(format!("failed to parse event: {}", e))
                .with_provider("google")
        })?;

        convert_event(api_event).ok_or_else(|| {
            ProviderError::target_unavailable("event response missing required fields")
                .with_provider("google")
        })
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        )
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else {
        format!("request failed: {}", e)
    };
    ProviderError::target_unavailable(message).with_provider("google")
}

/// Maps an unsuccessful HTTP status to a provider error.
///
/// Rate limiting and server trouble are transient; everything else in the
/// 4xx range (bad calendar id, revoked credentials, validation) will not
/// heal on its own and is reported as a rejection.
fn status_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ProviderError::target_unavailable(format!("API error ({}): {}", status, body))
            .with_provider("google")
    } else {
        ProviderError::target_rejected(format!("API error ({}): {}", status, body))
            .with_provider("google")
    }
}

/// Converts an API event into the observed model.
///
/// Events without timed start/end (all-day entries) cannot have been created
/// by this system and are skipped; events whose timestamps fail to parse are
/// skipped with a warning rather than failing the listing.
fn convert_event(event: ApiEvent) -> Option<ObservedEvent> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let id = event.id?;
    let start = parse_event_time(event.start.as_ref(), &id)?;
    let end = parse_event_time(event.end.as_ref(), &id)?;

    let key = event
        .extended_properties
        .and_then(|p| p.private)
        .and_then(|mut private| private.remove(EXTENDED_PROPERTY_KEY))
        .map(EventKey::new);

    let mut observed = ObservedEvent::new(id, start, end)
        .with_title(event.summary.unwrap_or_default())
        .with_location(event.location.unwrap_or_default());
    observed.key = key;
    observed.etag = event.etag;
    Some(observed)
}

fn parse_event_time(time: Option<&ApiEventTime>, event_id: &str) -> Option<DateTime<FixedOffset>> {
    let time = time?;
    let Some(ref date_time) = time.date_time else {
        // All-day event; not ours.
        return None;
    };
    match DateTime::parse_from_rfc3339(date_time) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(event = event_id, error = %e, "unparseable event time, skipping event");
            None
        }
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    location: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    status: Option<String>,
    etag: Option<String>,
    extended_properties: Option<ApiExtendedProperties>,
}

/// Event time from the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    #[allow(dead_code)]
    date: Option<String>,
    date_time: Option<String>,
}

/// Extended properties from the API.
#[derive(Debug, Deserialize)]
struct ApiExtendedProperties {
    private: Option<HashMap<String, String>>,
}

/// Write-side event body for insert and patch requests.
///
/// Absent fields are omitted from the payload entirely, which is what makes
/// PATCH updates field-minimal: the target keeps its stored value for every
/// field not present.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<ApiEventTimeWrite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<ApiEventTimeWrite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extended_properties: Option<ApiExtendedPropertiesWrite>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTimeWrite {
    date_time: String,
}

#[derive(Debug, Serialize)]
struct ApiExtendedPropertiesWrite {
    private: HashMap<String, String>,
}

impl ApiEventWrite {
    fn from_desired(event: &CalendarEvent) -> Self {
        let mut private = HashMap::new();
        private.insert(
            EXTENDED_PROPERTY_KEY.to_string(),
            event.key.as_str().to_string(),
        );

        Self {
            summary: Some(event.title.clone()),
            location: Some(event.location.clone()),
            start: Some(ApiEventTimeWrite {
                date_time: event.start.to_rfc3339(),
            }),
            end: Some(ApiEventTimeWrite {
                date_time: event.end.to_rfc3339(),
            }),
            extended_properties: Some(ApiExtendedPropertiesWrite { private }),
        }
    }

    fn from_patch(patch: &EventPatch) -> Self {
        Self {
            summary: patch.title.clone(),
            location: patch.location.clone(),
            start: patch.start.map(|dt| ApiEventTimeWrite {
                date_time: dt.to_rfc3339(),
            }),
            end: patch.end.map(|dt| ApiEventTimeWrite {
                date_time: dt.to_rfc3339(),
            }),
            extended_properties: None,
        }
    }
}
