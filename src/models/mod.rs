//! Data models for the TripFuel service
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates and normalized city/state pairs
//! - Route: driving route from the maps provider
//! - Station: fuel price table rows
//! - Trip: the computed plan with its fuel stops

pub mod location;
pub mod route;
pub mod station;
pub mod trip;

// Re-export all public types for convenient access
pub use location::{CityState, Coordinates};
pub use route::Route;
pub use station::FuelStation;
pub use trip::{FuelStop, SkippedStop, TripPlan, VehicleProfile};
