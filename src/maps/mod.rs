//! Maps provider
//!
//! Route distance and geometry, plus forward and reverse geocoding. The
//! planner only talks to the [`MapsProvider`] trait; [`GoogleMapsClient`] is
//! the production implementation and [`CachedMapsProvider`] decorates any
//! provider with the persistent cache.

use async_trait::async_trait;

use crate::Result;
use crate::models::{CityState, Coordinates, Route};

pub mod cached;
pub mod google;

pub use cached::CachedMapsProvider;
pub use google::GoogleMapsClient;

#[async_trait]
pub trait MapsProvider: Send + Sync {
    /// Driving route between two places given as addresses, "City, ST" or "lat,lng"
    async fn directions(&self, origin: &str, destination: &str) -> Result<Route>;

    /// City and state containing the point, `None` when the point is not in a city
    async fn reverse_geocode(&self, point: &Coordinates) -> Result<Option<CityState>>;

    /// Coordinates of an address, `None` when nothing matches
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>>;
}
