//! Fuel station catalog loaded from the price CSV
//!
//! The table is the OPIS truckstop export: `OPIS Truckstop ID`,
//! `Truckstop Name`, `Address`, `City`, `State`, `Rack ID`, `Retail Price`,
//! optionally followed by `Latitude`/`Longitude`. Headers are matched
//! case-insensitively, ignoring whitespace and punctuation.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::models::{CityState, Coordinates, FuelStation};
use crate::{Result, TripFuelError};

/// Column positions resolved from the CSV header
#[derive(Debug, Default)]
struct Columns {
    id: Option<usize>,
    name: usize,
    address: Option<usize>,
    city: usize,
    state: usize,
    rack_id: Option<usize>,
    retail_price: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |synonyms: &[&str]| {
            normalized
                .iter()
                .position(|header| synonyms.contains(&header.as_str()))
        };

        let require = |field: &str, synonyms: &[&str]| {
            find(synonyms).ok_or_else(|| {
                TripFuelError::station_data(format!(
                    "Missing required column '{field}' (found: {})",
                    headers.iter().collect::<Vec<_>>().join(", ")
                ))
            })
        };

        Ok(Self {
            id: find(&["opistruckstopid", "truckstopid", "id"]),
            name: require("Truckstop Name", &["truckstopname", "stationname", "name"])?,
            address: find(&["address"]),
            city: require("City", &["city"])?,
            state: require("State", &["state"])?,
            rack_id: find(&["rackid"]),
            retail_price: find(&["retailprice", "price"]),
            latitude: find(&["latitude", "lat"]),
            longitude: find(&["longitude", "lon", "lng"]),
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<FuelStation> {
        let field = |index: usize| record.get(index).map(str::trim).unwrap_or_default();
        let optional = |index: Option<usize>| index.map(field).filter(|value| !value.is_empty());

        let name = field(self.name);
        if name.is_empty() {
            return Err(TripFuelError::station_data("Empty truckstop name"));
        }

        let city = field(self.city);
        let state = field(self.state);
        if city.is_empty() || state.is_empty() {
            return Err(TripFuelError::station_data(format!(
                "Station '{name}' has no city or state"
            )));
        }

        let retail_price = match optional(self.retail_price) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
                TripFuelError::station_data(format!("Invalid retail price '{raw}' for '{name}'"))
            })?),
            None => None,
        };

        let coordinates = match (optional(self.latitude), optional(self.longitude)) {
            (Some(lat), Some(lon)) => match (lat.parse::<f64>(), lon.parse::<f64>()) {
                (Ok(lat), Ok(lon)) => {
                    Some(Coordinates::new(lat, lon)).filter(Coordinates::is_valid)
                }
                _ => None,
            },
            _ => None,
        };

        Ok(FuelStation {
            id: optional(self.id).and_then(|raw| raw.parse().ok()),
            name: name.to_string(),
            address: optional(self.address).unwrap_or_default().to_string(),
            location: CityState::new(city, state),
            rack_id: optional(self.rack_id).and_then(|raw| raw.parse().ok()),
            retail_price,
            coordinates,
        })
    }
}

fn normalize_header(header: &str) -> String {
    header
        .to_ascii_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Fuel stations indexed by city and state
#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    stations: Vec<FuelStation>,
    by_city: HashMap<CityState, Vec<usize>>,
    source: Option<PathBuf>,
}

impl StationCatalog {
    /// Load the catalog from a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading fuel stations from: {:?}", path);

        if !path.exists() {
            return Err(TripFuelError::station_data(format!(
                "Fuel station file not found at {}",
                path.display()
            )));
        }

        let file = fs::File::open(path)?;
        let mut catalog = Self::from_reader(file)?;
        catalog.source = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// Load the catalog from any CSV reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let columns = Columns::from_headers(&headers)?;

        let mut stations = Vec::new();
        let mut parse_errors = 0;

        for (line, record) in csv_reader.records().enumerate() {
            let parsed = record
                .map_err(TripFuelError::from)
                .and_then(|record| columns.parse(&record));
            match parsed {
                Ok(station) => stations.push(station),
                Err(e) => {
                    // +2: one for the header, one for 1-based numbering
                    warn!("Skipping fuel station row {}: {}", line + 2, e);
                    parse_errors += 1;
                }
            }
        }

        info!(
            "Loaded {} fuel stations ({} parse errors)",
            stations.len(),
            parse_errors
        );

        if stations.is_empty() && parse_errors > 0 {
            return Err(TripFuelError::station_data(
                "No valid fuel stations could be parsed",
            ));
        }

        Ok(Self::from_stations(stations))
    }

    /// Build a catalog from already parsed stations, keeping their order
    #[must_use]
    pub fn from_stations(stations: Vec<FuelStation>) -> Self {
        let mut by_city: HashMap<CityState, Vec<usize>> = HashMap::new();
        for (index, station) in stations.iter().enumerate() {
            by_city
                .entry(station.location.clone())
                .or_default()
                .push(index);
        }

        Self {
            stations,
            by_city,
            source: None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    #[must_use]
    pub fn stations(&self) -> &[FuelStation] {
        &self.stations
    }

    /// File the catalog was read from, if any
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Distinct city/state pairs, sorted by state then city
    #[must_use]
    pub fn available_locations(&self) -> Vec<CityState> {
        let mut locations: Vec<CityState> = self.by_city.keys().cloned().collect();
        locations.sort_by(|a, b| a.state.cmp(&b.state).then_with(|| a.city.cmp(&b.city)));
        locations
    }

    #[must_use]
    pub fn contains_location(&self, location: &CityState) -> bool {
        self.by_city.contains_key(location)
    }

    /// First station listed for the city, unless that station is already used
    /// on this trip
    #[must_use]
    pub fn find_in_city(
        &self,
        location: &CityState,
        used_stations: &HashSet<String>,
    ) -> Option<&FuelStation> {
        let station = self
            .by_city
            .get(location)
            .and_then(|indices| indices.first())
            .map(|&index| &self.stations[index])?;

        if used_stations.contains(&station.name) {
            debug!("Station {} already used on this trip", station.name);
            return None;
        }

        Some(station)
    }

    /// Coordinates of any station in the city that carries them
    #[must_use]
    pub fn coordinates_for(&self, location: &CityState) -> Option<Coordinates> {
        self.by_city
            .get(location)?
            .iter()
            .find_map(|&index| self.stations[index].coordinates)
    }
}
