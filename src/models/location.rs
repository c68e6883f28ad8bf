//! Location models for geographic coordinates and city/state pairs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Point on the earth in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether latitude and longitude are within their valid ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Format as the `lat,lng` pair accepted by the maps API
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Generate cache key for reverse geocoding this point
    #[must_use]
    pub fn cache_key(&self) -> String {
        let (lat, lon) = self.rounded(4);
        format!("{lat:.4}:{lon:.4}")
    }
}

/// City and state pair, normalized for matching against the station table
///
/// The city is kept trimmed and lower case, the state trimmed and upper case.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CityState {
    pub city: String,
    pub state: String,
}

impl CityState {
    #[must_use]
    pub fn new(city: &str, state: &str) -> Self {
        Self {
            city: normalize_city(city),
            state: normalize_state(state),
        }
    }

    /// City name in title case for display ("el paso" -> "El Paso")
    #[must_use]
    pub fn display_city(&self) -> String {
        title_case(&self.city)
    }
}

impl fmt::Display for CityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.display_city(), self.state)
    }
}

#[must_use]
pub fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

#[must_use]
pub fn normalize_state(state: &str) -> String {
    state.trim().to_uppercase()
}

#[must_use]
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
