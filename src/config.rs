//! Configuration management for the `TripFuel` service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TripFuelError;
use crate::models::VehicleProfile;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shortest vehicle range accepted; bounds the number of stops per trip
pub const MIN_RANGE_MILES: f64 = 1.0;

/// Environment variable consulted when no API key is configured
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Root configuration structure for the `TripFuel` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TripFuelConfig {
    /// Google Maps API configuration
    pub google: GoogleConfig,
    /// Vehicle figures used for stop and cost estimates
    pub vehicle: VehicleConfig,
    /// Fuel price table location
    pub stations: StationsConfig,
    /// Trip planning options
    pub planner: PlannerConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP server settings
    pub server: ServerConfig,
}

/// Google Maps API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Maps platform API key
    pub api_key: Option<String>,
    /// Directions endpoint
    pub directions_url: String,
    /// Geocoding endpoint (forward and reverse)
    pub geocode_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Miles driven on one full tank
    pub range_miles: f64,
    /// Miles per gallon
    pub mpg: f64,
    /// Price per gallon used when a station has none
    pub default_fuel_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationsConfig {
    /// Path of the fuel price CSV
    pub csv_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Resolve station coordinates and detour distance for each stop
    pub locate_stations: bool,
    /// Reject city/state inputs that are not in the station table
    pub restrict_to_known_locations: bool,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Cache TTL in hours
    pub ttl_hours: u32,
    /// Cache directory location
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Serve HTTPS when set (requires the `tls` feature)
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

// Default value functions
fn default_directions_url() -> String {
    "https://maps.googleapis.com/maps/api/directions/json".to_string()
}

fn default_geocode_url() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_google_timeout() -> u32 {
    30
}

fn default_google_max_retries() -> u32 {
    3
}

fn default_range_miles() -> f64 {
    500.0
}

fn default_mpg() -> f64 {
    10.0
}

fn default_fuel_price() -> f64 {
    3.50
}

fn default_csv_path() -> String {
    "fuel-prices.csv".to_string()
}

fn default_cache_ttl() -> u32 {
    24
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("tripfuel").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".cache/tripfuel".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            directions_url: default_directions_url(),
            geocode_url: default_geocode_url(),
            timeout_seconds: default_google_timeout(),
            max_retries: default_google_max_retries(),
        }
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            range_miles: default_range_miles(),
            mpg: default_mpg(),
            default_fuel_price: default_fuel_price(),
        }
    }
}

impl VehicleConfig {
    #[must_use]
    pub fn profile(&self) -> VehicleProfile {
        VehicleProfile {
            range_miles: self.range_miles,
            mpg: self.mpg,
        }
    }
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            locate_stations: true,
            restrict_to_known_locations: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls: None,
        }
    }
}

impl TripFuelConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRIPFUEL_VEHICLE__MPG=8 overrides vehicle.mpg
        builder = builder.add_source(
            Environment::with_prefix("TRIPFUEL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripFuelConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if config.google.api_key.is_none() {
            config.google.api_key = std::env::var(GOOGLE_API_KEY_ENV).ok();
        }

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripfuel").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.google.directions_url.is_empty() {
            self.google.directions_url = default_directions_url();
        }
        if self.google.geocode_url.is_empty() {
            self.google.geocode_url = default_geocode_url();
        }
        if self.google.timeout_seconds == 0 {
            self.google.timeout_seconds = default_google_timeout();
        }
        if self.google.api_key.as_deref().is_some_and(str::is_empty) {
            self.google.api_key = None;
        }
        if self.stations.csv_path.is_empty() {
            self.stations.csv_path = default_csv_path();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the maps API key when one is set
    pub fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.google.api_key {
            if api_key.len() < 8 {
                return Err(TripFuelError::config(
                    "Google Maps API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 100 {
                return Err(TripFuelError::config(
                    "Google Maps API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.google.timeout_seconds > 300 {
            return Err(
                TripFuelError::config("Google Maps API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.google.max_retries > 10 {
            return Err(
                TripFuelError::config("Google Maps API max retries cannot exceed 10").into(),
            );
        }

        if !(self.vehicle.range_miles >= MIN_RANGE_MILES && self.vehicle.range_miles.is_finite()) {
            return Err(TripFuelError::config(format!(
                "Vehicle range must be at least {MIN_RANGE_MILES} miles"
            ))
            .into());
        }

        if !(self.vehicle.mpg > 0.0 && self.vehicle.mpg.is_finite()) {
            return Err(TripFuelError::config("Vehicle miles per gallon must be positive").into());
        }

        if !(self.vehicle.default_fuel_price >= 0.0 && self.vehicle.default_fuel_price.is_finite())
        {
            return Err(TripFuelError::config("Default fuel price cannot be negative").into());
        }

        if self.cache.ttl_hours > 24 * 30 {
            return Err(
                TripFuelError::config("Cache TTL cannot exceed 720 hours (30 days)").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripFuelError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripFuelError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("directions", &self.google.directions_url),
            ("geocode", &self.google.geocode_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripFuelError::config(format!(
                    "Google Maps {name} URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
