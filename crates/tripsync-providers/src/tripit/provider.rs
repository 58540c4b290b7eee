//! TripIt implementation of [`ItinerarySource`].

use tripsync_core::Trip;

use crate::error::ProviderResult;
use crate::source::{BoxFuture, ItinerarySource, TripFilter};
use crate::tripit::client::TripItClient;
use crate::tripit::config::TripItConfig;

/// The TripIt itinerary source.
#[derive(Debug)]
pub struct TripItSource {
    client: TripItClient,
}

impl TripItSource {
    /// Creates a source from the given configuration.
    pub fn new(config: TripItConfig) -> ProviderResult<Self> {
        Ok(Self {
            client: TripItClient::new(config)?,
        })
    }
}

impl ItinerarySource for TripItSource {
    fn name(&self) -> &str {
        "tripit"
    }

    fn list_trips(&self, filter: TripFilter) -> BoxFuture<'_, ProviderResult<Vec<Trip>>> {
        Box::pin(async move {
            let mut trips = self.client.list_trips(filter.include_past).await?;
            if !filter.include_cancelled {
                for trip in &mut trips {
                    trip.segments.retain(|s| !s.status.is_cancelled());
                }
            }
            Ok(trips)
        })
    }
}
