//! TripIt API client.
//!
//! Low-level HTTP client for the TripIt v1 API: request building, Basic
//! authentication, and conversion of the wire payload into core trip types.
//!
//! The TripIt JSON encoding collapses single-element lists into bare
//! objects, so every list-valued field is parsed through [`OneOrMany`].

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use tracing::debug;

use tripsync_core::{FlightSegment, SegmentStatus, Trip};

use crate::error::{ProviderError, ProviderResult};
use crate::tripit::config::TripItConfig;

/// TripIt API client.
#[derive(Debug)]
pub struct TripItClient {
    http_client: reqwest::Client,
    config: TripItConfig,
}

impl TripItClient {
    /// Creates a new TripIt client from the given configuration.
    pub fn new(config: TripItConfig) -> ProviderResult<Self> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration("failed to create HTTP client")
                    .with_provider("tripit")
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Lists trips with all embedded objects (flights included).
    ///
    /// `past` selects between past and upcoming trips, mirroring the API's
    /// path-style filter.
    pub async fn list_trips(&self, past: bool) -> ProviderResult<Vec<Trip>> {
        let url = format!(
            "{}/v1/list/trip/past/{}/include_objects/true/format/json",
            self.config.base_url, past
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.token))
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    "request timeout".to_string()
                } else {
                    format!("request failed: {}", e)
                };
                ProviderError::source_unavailable(message).with_provider("tripit")
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(
                ProviderError::source_unavailable("authentication rejected").with_provider("tripit")
            );
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::source_unavailable(format!(
                "API error ({}): {}",
                status, body
            ))
            .with_provider("tripit"));
        }

        let body = response.text().await.map_err(|e| {
            ProviderError::source_unavailable(format!("failed to read response: {}", e))
                .with_provider("tripit")
        })?;

        let list: ListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::source_malformed(format!("failed to parse response: {}", e))
                .with_provider("tripit")
        })?;

        let today = chrono::Utc::now().date_naive();
        let trips = convert_response(list, today);
        debug!(count = trips.len(), past = past, "fetched trips from tripit");
        Ok(trips)
    }
}

/// Assembles core trips from the wire payload.
///
/// Air objects reference their trip by id; segments missing a flight
/// designator are dropped here since nothing downstream could key them.
fn convert_response(list: ListResponse, today: NaiveDate) -> Vec<Trip> {
    let api_trips = list.trips.map(OneOrMany::into_vec).unwrap_or_default();
    let air_objects = list.air_objects.map(OneOrMany::into_vec).unwrap_or_default();

    let mut trips: Vec<Trip> = api_trips
        .into_iter()
        .map(|t| {
            let is_past = t
                .end_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .is_some_and(|end| end < today);
            Trip::new(t.id)
                .with_display_name(t.display_name.unwrap_or_default())
                .with_past(is_past)
        })
        .collect();

    for air in air_objects {
        let Some(trip_id) = air.trip_id else {
            continue;
        };
        let Some(trip) = trips.iter_mut().find(|t| t.id == trip_id) else {
            debug!(trip_id = %trip_id, "air object references unknown trip");
            continue;
        };
        for segment in air.segments.map(OneOrMany::into_vec).unwrap_or_default() {
            match convert_segment(segment) {
                Some(segment) => trip.segments.push(segment),
                None => debug!(trip_id = %trip.id, "segment without flight designator, dropped"),
            }
        }
    }

    trips
}

fn convert_segment(api: ApiAirSegment) -> Option<FlightSegment> {
    let carrier = api.marketing_airline_code.filter(|c| !c.trim().is_empty())?;
    let number = api
        .marketing_flight_number
        .filter(|n| !n.trim().is_empty())?;

    let status = api
        .status
        .as_deref()
        .and_then(|s| s.parse::<u32>().ok())
        .map(SegmentStatus::from_code)
        .unwrap_or_default();

    let mut segment = FlightSegment::new(
        carrier,
        number,
        api.start_airport_code.unwrap_or_default(),
        api.end_airport_code.unwrap_or_default(),
    )
    .with_status(status);
    segment.departure = api.start_date_time.as_ref().and_then(ApiDateTime::to_instant);
    segment.arrival = api.end_date_time.as_ref().and_then(ApiDateTime::to_instant);

    Some(segment)
}

/// A list-valued field that the API may encode as a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

/// Response from the list/trip endpoint.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(rename = "Trip")]
    trips: Option<OneOrMany<ApiTrip>>,
    #[serde(rename = "AirObject")]
    air_objects: Option<OneOrMany<ApiAirObject>>,
}

/// A trip from the API.
#[derive(Debug, Deserialize)]
struct ApiTrip {
    id: String,
    display_name: Option<String>,
    #[allow(dead_code)]
    start_date: Option<String>,
    end_date: Option<String>,
}

/// A flight reservation from the API, holding one or more segments.
#[derive(Debug, Deserialize)]
struct ApiAirObject {
    trip_id: Option<String>,
    #[serde(rename = "Segment")]
    segments: Option<OneOrMany<ApiAirSegment>>,
}

/// A flight segment from the API.
#[derive(Debug, Deserialize)]
struct ApiAirSegment {
    marketing_airline_code: Option<String>,
    marketing_flight_number: Option<String>,
    start_airport_code: Option<String>,
    end_airport_code: Option<String>,
    #[serde(rename = "StartDateTime")]
    start_date_time: Option<ApiDateTime>,
    #[serde(rename = "EndDateTime")]
    end_date_time: Option<ApiDateTime>,
    status: Option<String>,
}

/// TripIt's split date/time representation.
#[derive(Debug, Deserialize)]
struct ApiDateTime {
    date: Option<String>,
    time: Option<String>,
    utc_offset: Option<String>,
    #[allow(dead_code)]
    timezone: Option<String>,
}

impl ApiDateTime {
    /// Combines the split fields into an offset-aware instant.
    ///
    /// Any missing piece yields `None`: an instant without its offset would
    /// have to be guessed into a timezone, and a guessed instant is worse
    /// than a skipped segment.
    fn to_instant(&self) -> Option<DateTime<FixedOffset>> {
        let date = self.date.as_deref()?;
        let time = self.time.as_deref()?;
        let offset = self.utc_offset.as_deref()?;
        DateTime::parse_from_rfc3339(&format!("{}T{}{}", date, time, offset)).ok()
    }
}
