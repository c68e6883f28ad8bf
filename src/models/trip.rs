//! Trip plan returned to API callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Vehicle figures the plan was computed with
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct VehicleProfile {
    /// Miles driven on one full tank
    pub range_miles: f64,
    /// Miles per gallon
    pub mpg: f64,
}

impl VehicleProfile {
    /// Gallons burnt driving the given distance
    #[must_use]
    pub fn gallons_for(&self, miles: f64) -> f64 {
        miles / self.mpg
    }

    /// Gallons refilled at each stop, a full tank worth of range
    #[must_use]
    pub fn gallons_per_stop(&self) -> f64 {
        self.gallons_for(self.range_miles)
    }
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self {
            range_miles: 500.0,
            mpg: 10.0,
        }
    }
}

/// Suggested refueling point
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FuelStop {
    pub name: String,
    pub address: String,
    /// City in title case
    pub city: String,
    pub state: String,
    pub fuel_price_per_gallon: f64,
    pub fuel_needed_gallons: f64,
    pub total_cost: f64,
    /// Mile marker on the route where the stop is due
    pub miles_traveled: f64,
    /// Route waypoint the stop was matched at
    pub route_position: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_coordinates: Option<Coordinates>,
    /// Great-circle distance from the route waypoint to the station
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detour_miles: Option<f64>,
}

/// Mile marker for which no station could be assigned
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SkippedStop {
    pub miles_traveled: f64,
    pub route_position: Coordinates,
    pub reason: String,
}

/// Full trip computation result
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TripPlan {
    pub start: String,
    pub finish: String,
    pub start_address: String,
    pub end_address: String,
    pub total_distance_miles: f64,
    pub estimated_travel_time: String,
    pub vehicle: VehicleProfile,
    pub fuel_stops: Vec<FuelStop>,
    pub skipped_stops: Vec<SkippedStop>,
    /// Sum of the stop costs
    pub total_fuel_cost: f64,
    /// Fuel burnt over the whole distance
    pub total_fuel_gallons: f64,
    /// Encoded overview polyline, for drawing the route on a map
    pub route_polyline: String,
    pub generated_at: DateTime<Utc>,
}

/// Round to cents / hundredths of a gallon
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
