//! Error types and handling for the `TripFuel` service

use thiserror::Error;

/// Main error type for the `TripFuel` service
#[derive(Error, Debug)]
pub enum TripFuelError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Maps API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// The maps API refused the request because of its quota
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// A route or location could not be found
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Fuel station table errors
    #[error("Station data error: {message}")]
    StationData { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl TripFuelError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    pub fn rate_limited<S: Into<String>>(message: S) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn station_data<S: Into<String>>(message: S) -> Self {
        Self::StationData {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripFuelError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TripFuelError::Api { .. } => {
                "Unable to reach the maps service. Please try again later.".to_string()
            }
            TripFuelError::RateLimited { .. } => {
                "The maps service quota is exhausted. Please try again later.".to_string()
            }
            TripFuelError::NotFound { message } => message.clone(),
            TripFuelError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TripFuelError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            TripFuelError::StationData { .. } => {
                "Fuel station data could not be read. Please check the CSV file.".to_string()
            }
            TripFuelError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            TripFuelError::General { message } => message.clone(),
        }
    }
}

impl From<csv::Error> for TripFuelError {
    fn from(err: csv::Error) -> Self {
        TripFuelError::station_data(err.to_string())
    }
}
