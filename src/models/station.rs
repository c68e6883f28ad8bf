//! Fuel station record from the price table

use serde::{Deserialize, Serialize};

use super::{CityState, Coordinates};

/// One row of the fuel price CSV
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FuelStation {
    /// OPIS truckstop identifier
    pub id: Option<u64>,
    pub name: String,
    pub address: String,
    /// Normalized city and state
    pub location: CityState,
    pub rack_id: Option<u64>,
    /// Retail price per gallon
    pub retail_price: Option<f64>,
    /// Present only when the table carries latitude/longitude columns
    pub coordinates: Option<Coordinates>,
}

impl FuelStation {
    /// Address line suitable for geocoding
    #[must_use]
    pub fn full_address(&self) -> String {
        format!(
            "{}, {}, {}",
            self.address.trim(),
            self.location.display_city(),
            self.location.state
        )
    }

    /// Retail price, or the given fallback when the table has none
    #[must_use]
    pub fn price_or(&self, default_price: f64) -> f64 {
        self.retail_price.unwrap_or(default_price)
    }
}
