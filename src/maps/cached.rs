use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::MapsProvider;
use crate::Result;
use crate::cache::{PersistentCache, ttl_with_jitter};
use crate::models::{CityState, Coordinates, Route};

/// Maps provider decorator that keeps answers in the persistent cache
///
/// Cache failures never fail a request: they are logged and the inner
/// provider is asked instead.
pub struct CachedMapsProvider<P> {
    inner: P,
    cache: Arc<PersistentCache>,
    ttl: Duration,
}

impl<P: MapsProvider> CachedMapsProvider<P> {
    pub fn new(inner: P, cache: Arc<PersistentCache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    async fn lookup<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Option<T> {
        match self.cache.get::<T>(key).await {
            Ok(Some(value)) => {
                debug!("Cache hit for {}", key);
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn store<T: Serialize + Send + 'static>(&self, key: &str, value: T) {
        if let Err(e) = self.cache.put(key, value, ttl_with_jitter(self.ttl)).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }
}

fn normalize_key_part(text: &str) -> String {
    urlencoding::encode(&text.trim().to_lowercase()).into_owned()
}

#[async_trait]
impl<P: MapsProvider> MapsProvider for CachedMapsProvider<P> {
    async fn directions(&self, origin: &str, destination: &str) -> Result<Route> {
        let key = format!(
            "directions:{}|{}",
            normalize_key_part(origin),
            normalize_key_part(destination)
        );

        if let Some(route) = self.lookup::<Route>(&key).await {
            return Ok(route);
        }

        let route = self.inner.directions(origin, destination).await?;
        self.store(&key, route.clone()).await;
        Ok(route)
    }

    async fn reverse_geocode(&self, point: &Coordinates) -> Result<Option<CityState>> {
        let key = format!("reverse:{}", point.cache_key());

        if let Some(place) = self.lookup::<Option<CityState>>(&key).await {
            return Ok(place);
        }

        let place = self.inner.reverse_geocode(point).await?;
        self.store(&key, place.clone()).await;
        Ok(place)
    }

    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        let key = format!("geocode:{}", normalize_key_part(address));

        if let Some(point) = self.lookup::<Option<Coordinates>>(&key).await {
            return Ok(point);
        }

        let point = self.inner.geocode(address).await?;
        self.store(&key, point).await;
        Ok(point)
    }
}
