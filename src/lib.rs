//! `TripFuel` - trip distance, fuel stop and fuel cost planning
//!
//! This library provides the route lookup, fuel station catalog and trip
//! computation behind the `tripfuel` HTTP API and CLI.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod location_resolver;
pub mod logging;
pub mod maps;
pub mod models;
pub mod planner;
pub mod polyline;
pub mod stations;
pub mod web;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use config::TripFuelConfig;
pub use error::TripFuelError;
pub use location_resolver::{LocationInput, LocationParser, LocationResolver};
pub use maps::{CachedMapsProvider, GoogleMapsClient, MapsProvider};
pub use models::{CityState, Coordinates, FuelStation, FuelStop, Route, TripPlan, VehicleProfile};
pub use planner::TripPlanner;
pub use stations::StationCatalog;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripFuelError>;
