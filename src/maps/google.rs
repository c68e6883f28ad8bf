//! Google Maps Platform client (Directions and Geocoding APIs)

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::MapsProvider;
use crate::config::{GOOGLE_API_KEY_ENV, GoogleConfig};
use crate::models::route::meters_to_miles;
use crate::models::{CityState, Coordinates, Route};
use crate::polyline;
use crate::{Result, TripFuelError};

/// Google Maps API client
pub struct GoogleMapsClient {
    client: ClientWithMiddleware,
    api_key: String,
    directions_url: String,
    geocode_url: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
    overview_polyline: Option<EncodedPolyline>,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
    duration: TextValue,
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct EncodedPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GeocodeResult {
    fn component(&self, kind: &str) -> Option<&AddressComponent> {
        self.address_components
            .iter()
            .find(|component| component.types.iter().any(|t| t == kind))
    }

    /// City from the `locality` component, state from the short name of
    /// `administrative_area_level_1`
    fn city_state(&self) -> Option<CityState> {
        let city = self.component("locality")?;
        let state = self.component("administrative_area_level_1")?;
        Some(CityState::new(&city.long_name, &state.short_name))
    }
}

impl DirectionsRoute {
    fn into_route(self) -> Result<Route> {
        if self.legs.is_empty() {
            return Err(TripFuelError::api("Directions route has no legs"));
        }

        let encoded = self
            .overview_polyline
            .map(|polyline| polyline.points)
            .ok_or_else(|| TripFuelError::api("No polyline found in directions response"))?;
        let waypoints = polyline::decode(&encoded)?;

        let meters: f64 = self.legs.iter().map(|leg| leg.distance.value).sum();
        let seconds: f64 = self.legs.iter().map(|leg| leg.duration.value).sum();
        let duration_text = match self.legs.as_slice() {
            [single] => single.duration.text.clone(),
            _ => format_duration(seconds as u64),
        };

        let start_address = self
            .legs
            .first()
            .map(|leg| leg.start_address.clone())
            .unwrap_or_default();
        let end_address = self
            .legs
            .last()
            .map(|leg| leg.end_address.clone())
            .unwrap_or_default();

        Ok(Route {
            distance_miles: meters_to_miles(meters),
            duration_text,
            duration_seconds: seconds as u64,
            polyline: encoded,
            waypoints,
            start_address,
            end_address,
            summary: self.summary,
        })
    }
}

/// "1 day 2 hours", "5 hours 3 mins", "12 mins"
fn format_duration(seconds: u64) -> String {
    let plural = |value: u64, unit: &str| {
        if value == 1 {
            format!("{value} {unit}")
        } else {
            format!("{value} {unit}s")
        }
    };

    let minutes = (seconds + 30) / 60;
    let days = minutes / (24 * 60);
    let hours = (minutes / 60) % 24;
    let mins = minutes % 60;

    if days > 0 {
        format!("{} {}", plural(days, "day"), plural(hours, "hour"))
    } else if hours > 0 {
        format!("{} {}", plural(hours, "hour"), plural(mins, "min"))
    } else {
        plural(mins, "min")
    }
}

/// Map a Google API status to an error. `Ok(false)` means the request was
/// valid but matched nothing.
fn check_status(status: &str, error_message: Option<&str>, what: &str) -> Result<bool> {
    let detail = error_message.unwrap_or("no details provided");
    match status {
        "OK" => Ok(true),
        "ZERO_RESULTS" | "NOT_FOUND" => Ok(false),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(TripFuelError::rate_limited(format!(
            "{what} quota exceeded: {detail}"
        ))),
        "REQUEST_DENIED" => Err(TripFuelError::api(format!(
            "{what} request denied: {detail}"
        ))),
        "INVALID_REQUEST" | "MAX_WAYPOINTS_EXCEEDED" | "MAX_ROUTE_LENGTH_EXCEEDED" => Err(
            TripFuelError::validation(format!("{what} rejected the request ({status}): {detail}")),
        ),
        other => Err(TripFuelError::api(format!(
            "{what} returned status {other}: {detail}"
        ))),
    }
}

impl GoogleMapsClient {
    /// Create a new client; fails when no API key is configured
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            TripFuelError::config(format!(
                "Google Maps API key is not configured. Set google.api_key or {GOOGLE_API_KEY_ENV}."
            ))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("TripFuel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TripFuelError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            api_key,
            directions_url: config.directions_url.clone(),
            geocode_url: config.geocode_url.clone(),
        })
    }

    /// GET a Google endpoint and decode its JSON body. The API key is appended
    /// here, and error texts carry neither the URL nor the key.
    async fn get_json<T: DeserializeOwned>(
        &self,
        base_url: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut query = params.to_vec();
        query.push(("key", self.api_key.as_str()));

        let url = Url::parse_with_params(base_url, &query).map_err(|e| {
            TripFuelError::config(format!("Invalid maps API URL '{base_url}': {e}"))
        })?;

        let start_time = Instant::now();
        let response = self.client.get(url).send().await.map_err(|e| {
            TripFuelError::api(format!("Maps API request failed: {}", self.describe(e)))
        })?;

        let status = response.status();
        debug!(
            "Maps API responded {} in {:.3}s",
            status,
            start_time.elapsed().as_secs_f64()
        );

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TripFuelError::rate_limited(
                "Maps API rate limit exceeded (HTTP 429)",
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TripFuelError::api(format!(
                "Maps API returned HTTP {status}: {body}"
            )));
        }

        response.json::<T>().await.map_err(|e| {
            TripFuelError::api(format!(
                "Failed to parse maps API response: {}",
                self.redact(&e.without_url().to_string())
            ))
        })
    }

    fn describe(&self, err: reqwest_middleware::Error) -> String {
        let text = match err {
            reqwest_middleware::Error::Reqwest(e) => e.without_url().to_string(),
            reqwest_middleware::Error::Middleware(e) => format!("{e:#}"),
        };
        self.redact(&text)
    }

    fn redact(&self, text: &str) -> String {
        text.replace(&self.api_key, "***")
    }
}

#[async_trait]
impl MapsProvider for GoogleMapsClient {
    #[instrument(skip(self))]
    async fn directions(&self, origin: &str, destination: &str) -> Result<Route> {
        let response: DirectionsResponse = self
            .get_json(
                &self.directions_url,
                &[
                    ("origin", origin),
                    ("destination", destination),
                    ("mode", "driving"),
                ],
            )
            .await?;

        let found = check_status(
            &response.status,
            response.error_message.as_deref(),
            "Directions API",
        )?;
        let first_route = response.routes.into_iter().next();
        let route = match (found, first_route) {
            (true, Some(route)) => route.into_route()?,
            _ => {
                warn!("No route from '{}' to '{}'", origin, destination);
                return Err(TripFuelError::not_found(format!(
                    "No driving route found from '{origin}' to '{destination}'"
                )));
            }
        };

        info!(
            "Route {} -> {}: {:.1} miles, {}, {} waypoints",
            origin,
            destination,
            route.distance_miles,
            route.duration_text,
            route.waypoints.len()
        );
        Ok(route)
    }

    #[instrument(skip(self), fields(lat = point.latitude, lon = point.longitude))]
    async fn reverse_geocode(&self, point: &Coordinates) -> Result<Option<CityState>> {
        let latlng = point.to_query();
        let response: GeocodeResponse = self
            .get_json(&self.geocode_url, &[("latlng", latlng.as_str())])
            .await?;

        if !check_status(
            &response.status,
            response.error_message.as_deref(),
            "Geocoding API",
        )? {
            debug!("No reverse geocoding results for {}", latlng);
            return Ok(None);
        }

        let place = response.results.iter().find_map(GeocodeResult::city_state);
        match &place {
            Some(place) => debug!("Matched {} to {}", latlng, place),
            None => debug!("No city/state among results for {}", latlng),
        }
        Ok(place)
    }

    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        let response: GeocodeResponse = self
            .get_json(&self.geocode_url, &[("address", address)])
            .await?;

        if !check_status(
            &response.status,
            response.error_message.as_deref(),
            "Geocoding API",
        )? {
            debug!("No geocoding results for '{}'", address);
            return Ok(None);
        }

        Ok(response.results.first().map(|result| {
            Coordinates::new(result.geometry.location.lat, result.geometry.location.lng)
        }))
    }
}
