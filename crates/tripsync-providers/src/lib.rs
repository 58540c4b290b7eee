//! ItinerarySource and EventTarget traits and implementations (TripIt, Google Calendar)

pub mod error;
pub mod google;
pub mod source;
pub mod target;
pub mod tripit;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use source::{BoxFuture, ItinerarySource, TripFilter};
pub use target::EventTarget;
