//! Driving route returned by the maps provider

use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Meters to statute miles
pub const MILES_PER_METER: f64 = 0.000_621_371;

/// A driving route between two places
///
/// Stored in the persistent cache, so the layout must stay postcard friendly
/// (no skipped or flattened fields).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Route {
    /// Total driving distance in miles
    pub distance_miles: f64,
    /// Human readable travel time ("18 hours 5 mins")
    pub duration_text: String,
    /// Travel time in seconds
    pub duration_seconds: u64,
    /// Encoded overview polyline
    pub polyline: String,
    /// Decoded polyline vertices, in driving order
    pub waypoints: Vec<Coordinates>,
    pub start_address: String,
    pub end_address: String,
    /// Main roads of the route ("I-40 W")
    pub summary: String,
}

#[must_use]
pub fn meters_to_miles(meters: f64) -> f64 {
    meters * MILES_PER_METER
}
