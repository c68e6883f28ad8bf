//! Location Resolution Module
//!
//! Turns the free-text start/finish of a trip into something the directions
//! API understands, and finds coordinates for fuel stations.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::maps::MapsProvider;
use crate::models::{CityState, Coordinates, FuelStation};
use crate::stations::StationCatalog;
use crate::{Result, TripFuelError};

/// Types of location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// "35.4676,-97.5164"
    Coordinates(Coordinates),
    /// "Oklahoma City, OK"
    CityState(CityState),
    /// Anything else, passed to the maps API as is
    Address(String),
}

impl LocationInput {
    /// Value for the `origin` / `destination` parameter of the directions API
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            LocationInput::Coordinates(point) => point.to_query(),
            LocationInput::CityState(place) => place.to_string(),
            LocationInput::Address(address) => normalize_highway_address(address),
        }
    }
}

/// Location parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Parse location input (coordinates, "City, ST", addresses)
    pub fn parse(input: &str) -> Result<LocationInput> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TripFuelError::validation("Location cannot be empty"));
        }

        if let Some(point) = Self::parse_coordinates(input) {
            return Ok(LocationInput::Coordinates(point));
        }

        if let Some(place) = Self::parse_city_state(input) {
            return Ok(LocationInput::CityState(place));
        }

        Ok(LocationInput::Address(input.to_string()))
    }

    /// Parse coordinates from string like "35.4676,-97.5164" or "35.4676 -97.5164"
    fn parse_coordinates(input: &str) -> Option<Coordinates> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        let [lat, lon] = parts.as_slice() else {
            return None;
        };

        let point = Coordinates::new(lat.parse().ok()?, lon.parse().ok()?);
        point.is_valid().then_some(point)
    }

    /// "City, ST" with a two-letter state code
    fn parse_city_state(input: &str) -> Option<CityState> {
        let (city, state) = input.split_once(',')?;
        let city = city.trim();
        let state = state.trim();

        let is_state_code = state.len() == 2 && state.chars().all(|c| c.is_ascii_alphabetic());
        (!city.is_empty() && is_state_code).then(|| CityState::new(city, state))
    }
}

/// Highway exits ("I-44, EXIT 283") geocode far better with the country spelled out
#[must_use]
pub fn normalize_highway_address(address: &str) -> String {
    let address = address.trim();
    let upper = address.to_uppercase();
    let looks_like_exit = ["EXIT", "I-", "SR-"]
        .iter()
        .any(|marker| upper.contains(marker));

    if looks_like_exit && !upper.ends_with("USA") {
        format!("{address}, USA")
    } else {
        address.to_string()
    }
}

/// Service for resolving trip endpoints and station positions
pub struct LocationResolver {
    maps: Arc<dyn MapsProvider>,
    catalog: Arc<StationCatalog>,
    restrict_to_known_locations: bool,
}

impl LocationResolver {
    pub fn new(
        maps: Arc<dyn MapsProvider>,
        catalog: Arc<StationCatalog>,
        restrict_to_known_locations: bool,
    ) -> Self {
        Self {
            maps,
            catalog,
            restrict_to_known_locations,
        }
    }

    /// Parse a trip endpoint, checking it against the station table when
    /// restricted to known locations
    pub fn resolve_endpoint(&self, input: &str) -> Result<LocationInput> {
        let location = LocationParser::parse(input)?;
        debug!("Resolved location input '{}' to {:?}", input, location);

        if self.restrict_to_known_locations {
            match &location {
                LocationInput::CityState(place) if self.catalog.contains_location(place) => {}
                LocationInput::CityState(place) => {
                    return Err(TripFuelError::validation(format!(
                        "Unknown location '{place}'. See /api/locations for supported cities."
                    )));
                }
                _ => {
                    return Err(TripFuelError::validation(format!(
                        "Location '{input}' must be given as 'City, ST'"
                    )));
                }
            }
        }

        Ok(location)
    }

    /// Best known position of a station: the table's own coordinates, then
    /// geocoding its address, then any station position in the same city
    pub async fn locate_station(&self, station: &FuelStation) -> Option<Coordinates> {
        if let Some(point) = station.coordinates {
            return Some(point);
        }

        let address = normalize_highway_address(&station.full_address());
        match self.maps.geocode(&address).await {
            Ok(Some(point)) => {
                debug!(
                    "Geocoded station '{}' to {}",
                    station.name,
                    point.to_query()
                );
                return Some(point);
            }
            Ok(None) => debug!("Geocoding found nothing for '{}'", address),
            Err(e) => warn!("Geocoding failed for '{}': {}", address, e),
        }

        let fallback = self.catalog.coordinates_for(&station.location);
        if fallback.is_none() {
            debug!("No position known for station '{}'", station.name);
        }
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Route;
    use async_trait::async_trait;
    use rstest::rstest;

    #[rstest]
    #[case("35.4676,-97.5164", LocationInput::Coordinates(Coordinates::new(35.4676, -97.5164)))]
    #[case("35.4676 -97.5164", LocationInput::Coordinates(Coordinates::new(35.4676, -97.5164)))]
    #[case(
        " tomah , wi ",
        LocationInput::CityState(CityState::new("tomah", "WI"))
    )]
    #[case(
        "Oklahoma City, OK",
        LocationInput::CityState(CityState::new("oklahoma city", "OK"))
    )]
    #[case("91.0,8.0", LocationInput::Address("91.0,8.0".to_string()))]
    #[case("Denver", LocationInput::Address("Denver".to_string()))]
    #[case("1600 Amphitheatre Pkwy, Mountain View, CA", LocationInput::Address("1600 Amphitheatre Pkwy, Mountain View, CA".to_string()))]
    fn test_parse_location(#[case] input: &str, #[case] expected: LocationInput) {
        assert_eq!(LocationParser::parse(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_empty_location() {
        assert!(matches!(
            LocationParser::parse("   "),
            Err(TripFuelError::Validation { .. })
        ));
    }

    #[rstest]
    #[case(
        "I-44, EXIT 283 & US-69, Big Cabin, OK",
        "I-44, EXIT 283 & US-69, Big Cabin, OK, USA"
    )]
    #[case("SR-21, Tomah, WI", "SR-21, Tomah, WI, USA")]
    #[case(
        "I-40, EXIT 140, Oklahoma City, OK, USA",
        "I-40, EXIT 140, Oklahoma City, OK, USA"
    )]
    #[case("100 Main St, Tomah, WI", "100 Main St, Tomah, WI")]
    fn test_normalize_highway_address(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_highway_address(input), expected);
    }

    #[test]
    fn test_to_query() {
        let place = LocationInput::CityState(CityState::new("el paso", "tx"));
        assert_eq!(place.to_query(), "El Paso, TX");

        let point = LocationInput::Coordinates(Coordinates::new(31.76, -106.49));
        assert_eq!(point.to_query(), "31.76,-106.49");
    }

    struct FixedGeocoder(Option<Coordinates>);

    #[async_trait]
    impl MapsProvider for FixedGeocoder {
        async fn directions(&self, _origin: &str, _destination: &str) -> Result<Route> {
            Err(TripFuelError::general("not used"))
        }

        async fn reverse_geocode(&self, _point: &Coordinates) -> Result<Option<CityState>> {
            Ok(None)
        }

        async fn geocode(&self, _address: &str) -> Result<Option<Coordinates>> {
            self.0
                .map(Some)
                .ok_or_else(|| TripFuelError::api("geocoder down"))
        }
    }

    fn catalog() -> Arc<StationCatalog> {
        let csv = "Truckstop Name,Address,City,State,Retail Price,Latitude,Longitude\n\
                   NO COORDS,\"I-40, EXIT 140\",Amarillo,TX,2.99,,\n\
                   WITH COORDS,Main St,Amarillo,TX,3.10,35.2220,-101.8313\n";
        Arc::new(StationCatalog::from_reader(csv.as_bytes()).unwrap())
    }

    #[tokio::test]
    async fn test_locate_station_prefers_table_coordinates() {
        let catalog = catalog();
        let resolver = LocationResolver::new(
            Arc::new(FixedGeocoder(Some(Coordinates::new(1.0, 1.0)))),
            catalog.clone(),
            false,
        );

        let point = resolver.locate_station(&catalog.stations()[1]).await;
        assert_eq!(point, Some(Coordinates::new(35.2220, -101.8313)));
    }

    #[tokio::test]
    async fn test_locate_station_geocodes_address() {
        let catalog = catalog();
        let resolver = LocationResolver::new(
            Arc::new(FixedGeocoder(Some(Coordinates::new(35.19, -101.75)))),
            catalog.clone(),
            false,
        );

        let point = resolver.locate_station(&catalog.stations()[0]).await;
        assert_eq!(point, Some(Coordinates::new(35.19, -101.75)));
    }

    #[tokio::test]
    async fn test_locate_station_falls_back_to_city() {
        let catalog = catalog();
        let resolver = LocationResolver::new(Arc::new(FixedGeocoder(None)), catalog.clone(), false);

        let point = resolver.locate_station(&catalog.stations()[0]).await;
        assert_eq!(point, Some(Coordinates::new(35.2220, -101.8313)));
    }

    #[test]
    fn test_restricted_endpoints() {
        let resolver = LocationResolver::new(Arc::new(FixedGeocoder(None)), catalog(), true);

        assert!(resolver.resolve_endpoint("Amarillo, TX").is_ok());
        assert!(matches!(
            resolver.resolve_endpoint("Tomah, WI"),
            Err(TripFuelError::Validation { .. })
        ));
        assert!(matches!(
            resolver.resolve_endpoint("35.2,-101.8"),
            Err(TripFuelError::Validation { .. })
        ));
    }
}
