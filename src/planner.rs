//! Trip computation: route distance, fuel stops and fuel cost

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::config::{PlannerConfig, VehicleConfig};
use crate::geo::{
    coordinates_at_distance, distance_miles, nearest_waypoint, path_length_miles, stop_markers,
};
use crate::location_resolver::LocationResolver;
use crate::maps::MapsProvider;
use crate::models::trip::round2;
use crate::models::{
    CityState, Coordinates, FuelStation, FuelStop, Route, SkippedStop, TripPlan, VehicleProfile,
};
use crate::stations::StationCatalog;
use crate::{Result, TripFuelError};

/// Reverse geocoding requests in flight per trip
const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Plans trips against one maps provider and one station table
pub struct TripPlanner {
    maps: Arc<dyn MapsProvider>,
    catalog: Arc<StationCatalog>,
    resolver: LocationResolver,
    vehicle: VehicleProfile,
    default_fuel_price: f64,
    locate_stations: bool,
}

/// A mile marker placed on the route
#[derive(Debug, Clone, Copy)]
struct Marker {
    miles: f64,
    position: Coordinates,
}

impl TripPlanner {
    pub fn new(
        maps: Arc<dyn MapsProvider>,
        catalog: Arc<StationCatalog>,
        vehicle: &VehicleConfig,
        options: &PlannerConfig,
    ) -> Self {
        let resolver = LocationResolver::new(
            maps.clone(),
            catalog.clone(),
            options.restrict_to_known_locations,
        );

        Self {
            maps,
            catalog,
            resolver,
            vehicle: vehicle.profile(),
            default_fuel_price: vehicle.default_fuel_price,
            locate_stations: options.locate_stations,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    /// Cities the station table covers
    #[must_use]
    pub fn available_locations(&self) -> Vec<CityState> {
        self.catalog.available_locations()
    }

    /// Compute distance, fuel stops and fuel cost between two locations
    #[instrument(skip(self))]
    pub async fn plan(&self, start: &str, finish: &str) -> Result<TripPlan> {
        let origin = self.resolver.resolve_endpoint(start)?;
        let destination = self.resolver.resolve_endpoint(finish)?;

        let route = self
            .maps
            .directions(&origin.to_query(), &destination.to_query())
            .await?;
        info!(
            "Route {} -> {}: {:.1} miles, {}",
            route.start_address, route.end_address, route.distance_miles, route.duration_text
        );

        let markers = place_markers(&route, self.vehicle.range_miles)?;
        debug!("{} fuel stop markers", markers.len());

        let lookups: Vec<_> = markers
            .iter()
            .map(|marker| self.maps.reverse_geocode(&marker.position))
            .collect();
        let places: Vec<_> = stream::iter(lookups)
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await;

        let mut used_stations = HashSet::new();
        let mut fuel_stops = Vec::new();
        let mut skipped_stops = Vec::new();

        for (marker, place) in markers.into_iter().zip(places) {
            let place = match place {
                Ok(Some(place)) => place,
                Ok(None) => {
                    skipped_stops.push(skip(marker, "No city found at this point of the route"));
                    continue;
                }
                Err(e) => {
                    warn!(
                        "Reverse geocoding failed at mile {:.0}: {}",
                        marker.miles, e
                    );
                    skipped_stops.push(skip(marker, e.user_message()));
                    continue;
                }
            };

            let Some(station) = self.catalog.find_in_city(&place, &used_stations) else {
                debug!("No unused station in {} at mile {:.0}", place, marker.miles);
                skipped_stops.push(skip(marker, format!("No unused fuel station in {place}")));
                continue;
            };

            used_stations.insert(station.name.clone());
            fuel_stops.push(self.fuel_stop(station, marker).await);
        }

        let total_fuel_cost = round2(fuel_stops.iter().map(|stop| stop.total_cost).sum());
        info!(
            "Planned {} fuel stops ({} skipped), total fuel cost ${:.2}",
            fuel_stops.len(),
            skipped_stops.len(),
            total_fuel_cost
        );

        Ok(TripPlan {
            start: start.trim().to_string(),
            finish: finish.trim().to_string(),
            start_address: route.start_address,
            end_address: route.end_address,
            total_distance_miles: round2(route.distance_miles),
            estimated_travel_time: route.duration_text,
            vehicle: self.vehicle,
            fuel_stops,
            skipped_stops,
            total_fuel_cost,
            total_fuel_gallons: round2(self.vehicle.gallons_for(route.distance_miles)),
            route_polyline: route.polyline,
            generated_at: Utc::now(),
        })
    }

    async fn fuel_stop(&self, station: &FuelStation, marker: Marker) -> FuelStop {
        let price = station.price_or(self.default_fuel_price);
        let gallons = self.vehicle.gallons_per_stop();

        let station_coordinates = if self.locate_stations {
            self.resolver.locate_station(station).await
        } else {
            None
        };

        FuelStop {
            name: station.name.clone(),
            address: station.address.clone(),
            city: station.location.display_city(),
            state: station.location.state.clone(),
            fuel_price_per_gallon: round2(price),
            fuel_needed_gallons: round2(gallons),
            total_cost: round2(gallons * price),
            miles_traveled: round2(marker.miles),
            route_position: marker.position,
            station_coordinates,
            detour_miles: station_coordinates
                .map(|point| round2(distance_miles(&marker.position, &point))),
        }
    }
}

fn skip(marker: Marker, reason: impl Into<String>) -> SkippedStop {
    SkippedStop {
        miles_traveled: round2(marker.miles),
        route_position: marker.position,
        reason: reason.into(),
    }
}

/// Mile markers snapped to route waypoints
///
/// The overview polyline is shorter than the driven distance, so markers are
/// scaled onto the polyline length before walking it.
fn place_markers(route: &Route, range_miles: f64) -> Result<Vec<Marker>> {
    let markers = stop_markers(route.distance_miles, range_miles);
    if markers.is_empty() {
        return Ok(Vec::new());
    }

    if route.waypoints.len() < 2 {
        return Err(TripFuelError::api(
            "Route geometry has too few points to place fuel stops",
        ));
    }

    let path_miles = path_length_miles(&route.waypoints);
    let scale = if path_miles > 0.0 {
        path_miles / route.distance_miles
    } else {
        1.0
    };

    Ok(markers
        .into_iter()
        .filter_map(|miles| {
            let point = coordinates_at_distance(miles * scale, &route.waypoints)?;
            let position = nearest_waypoint(&point, &route.waypoints)?;
            Some(Marker { miles, position })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Straight route along the equator, one waypoint per degree of longitude
    fn equator_route(distance_miles: f64, degrees: usize) -> Route {
        Route {
            distance_miles,
            duration_text: "1 day 2 hours".to_string(),
            duration_seconds: 93_600,
            polyline: "encoded".to_string(),
            waypoints: (0..=degrees)
                .map(|lon| Coordinates::new(0.0, lon as f64))
                .collect(),
            start_address: "Start, USA".to_string(),
            end_address: "Finish, USA".to_string(),
            summary: "I-40".to_string(),
        }
    }

    /// Cities keyed by the rounded longitude of the reverse-geocoded waypoint
    struct FakeMaps {
        route: Route,
        cities: HashMap<i64, CityState>,
        fail_reverse: bool,
    }

    #[async_trait]
    impl MapsProvider for FakeMaps {
        async fn directions(&self, _origin: &str, _destination: &str) -> Result<Route> {
            Ok(self.route.clone())
        }

        async fn reverse_geocode(&self, point: &Coordinates) -> Result<Option<CityState>> {
            if self.fail_reverse {
                return Err(TripFuelError::rate_limited("OVER_QUERY_LIMIT"));
            }
            Ok(self.cities.get(&(point.longitude.round() as i64)).cloned())
        }

        async fn geocode(&self, _address: &str) -> Result<Option<Coordinates>> {
            Ok(None)
        }
    }

    const PRICES: &str = "\
OPIS Truckstop ID,Truckstop Name,Address,City,State,Rack ID,Retail Price
1,AMARILLO ONE,\"I-40, EXIT 64\",Amarillo,TX,10,3.00
2,AMARILLO TWO,\"I-40, EXIT 65\",Amarillo,TX,10,2.50
3,TUCUMCARI STOP,\"I-40, EXIT 333\",Tucumcari,NM,11,
4,GALLUP STOP,\"I-40, EXIT 20\",Gallup,NM,12,3.10
";

    fn planner(route: Route, cities: &[(i64, &str, &str)], fail_reverse: bool) -> TripPlanner {
        let maps = FakeMaps {
            route,
            cities: cities
                .iter()
                .map(|(lon, city, state)| (*lon, CityState::new(city, state)))
                .collect(),
            fail_reverse,
        };
        let catalog = StationCatalog::from_reader(PRICES.as_bytes()).unwrap();
        let options = PlannerConfig {
            locate_stations: false,
            restrict_to_known_locations: false,
        };
        TripPlanner::new(
            Arc::new(maps),
            Arc::new(catalog),
            &VehicleConfig::default(),
            &options,
        )
    }

    #[tokio::test]
    async fn test_short_trip_needs_no_stops() {
        let planner = planner(equator_route(500.0, 8), &[], false);
        let plan = planner.plan("Dallas, TX", "Houston, TX").await.unwrap();

        assert!(plan.fuel_stops.is_empty());
        assert!(plan.skipped_stops.is_empty());
        assert_eq!(plan.total_fuel_cost, 0.0);
        assert_eq!(plan.total_fuel_gallons, 50.0);
        assert_eq!(plan.total_distance_miles, 500.0);
    }

    #[tokio::test]
    async fn test_stops_every_range_with_costs() {
        // 16 degrees along the equator is ~1105 miles of polyline
        let planner = planner(
            equator_route(1200.0, 16),
            &[(7, "Amarillo", "TX"), (13, "Tucumcari", "NM")],
            false,
        );
        let plan = planner
            .plan("Oklahoma City, OK", "Albuquerque, NM")
            .await
            .unwrap();

        assert_eq!(plan.fuel_stops.len(), 2);
        let first = &plan.fuel_stops[0];
        assert_eq!(first.name, "AMARILLO ONE");
        assert_eq!(first.city, "Amarillo");
        assert_eq!(first.state, "TX");
        assert_eq!(first.miles_traveled, 500.0);
        assert_eq!(first.fuel_needed_gallons, 50.0);
        assert_eq!(first.total_cost, 150.0);

        // No price in the table: the default price applies
        let second = &plan.fuel_stops[1];
        assert_eq!(second.name, "TUCUMCARI STOP");
        assert_eq!(second.miles_traveled, 1000.0);
        assert_eq!(second.fuel_price_per_gallon, 3.5);
        assert_eq!(second.total_cost, 175.0);

        assert_eq!(plan.total_fuel_cost, 325.0);
        assert_eq!(plan.total_fuel_gallons, 120.0);
        assert_eq!(plan.estimated_travel_time, "1 day 2 hours");
        assert!(plan.skipped_stops.is_empty());
    }

    #[tokio::test]
    async fn test_used_station_is_not_reused() {
        let planner = planner(
            equator_route(1200.0, 16),
            &[(7, "Amarillo", "TX"), (13, "Amarillo", "TX")],
            false,
        );
        let plan = planner.plan("A, TX", "B, TX").await.unwrap();

        assert_eq!(plan.fuel_stops.len(), 1);
        assert_eq!(plan.fuel_stops[0].name, "AMARILLO ONE");
        assert_eq!(plan.skipped_stops.len(), 1);
        assert_eq!(plan.skipped_stops[0].miles_traveled, 1000.0);
        assert!(plan.skipped_stops[0].reason.contains("Amarillo, TX"));
    }

    #[tokio::test]
    async fn test_unresolved_markers_are_skipped() {
        let planner = planner(equator_route(1200.0, 16), &[(7, "Nowhere", "KS")], false);
        let plan = planner.plan("A, TX", "B, TX").await.unwrap();

        assert!(plan.fuel_stops.is_empty());
        assert_eq!(plan.skipped_stops.len(), 2);
        assert_eq!(plan.total_fuel_cost, 0.0);
    }

    #[tokio::test]
    async fn test_reverse_geocode_errors_are_skipped() {
        let planner = planner(equator_route(1200.0, 16), &[], true);
        let plan = planner.plan("A, TX", "B, TX").await.unwrap();

        assert!(plan.fuel_stops.is_empty());
        assert_eq!(plan.skipped_stops.len(), 2);
        assert!(plan.skipped_stops[0].reason.contains("quota"));
    }

    #[tokio::test]
    async fn test_missing_geometry_is_an_error() {
        let mut route = equator_route(1200.0, 16);
        route.waypoints.truncate(1);
        let planner = planner(route, &[], false);

        assert!(matches!(
            planner.plan("A, TX", "B, TX").await,
            Err(TripFuelError::Api { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let planner = planner(equator_route(100.0, 2), &[], false);
        assert!(matches!(
            planner.plan("  ", "B, TX").await,
            Err(TripFuelError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_station_location_and_detour() {
        let maps = FakeMaps {
            route: equator_route(700.0, 10),
            cities: HashMap::from([(7, CityState::new("gallup", "NM"))]),
            fail_reverse: false,
        };
        let csv = "Truckstop Name,City,State,Retail Price,Latitude,Longitude\n\
                   GALLUP STOP,Gallup,NM,3.10,0.5,7.0\n";
        let catalog = StationCatalog::from_reader(csv.as_bytes()).unwrap();
        let planner = TripPlanner::new(
            Arc::new(maps),
            Arc::new(catalog),
            &VehicleConfig::default(),
            &PlannerConfig::default(),
        );

        let plan = planner.plan("A, NM", "B, AZ").await.unwrap();
        let stop = &plan.fuel_stops[0];
        assert_eq!(stop.station_coordinates, Some(Coordinates::new(0.5, 7.0)));
        // Half a degree of latitude is ~34.5 miles
        let detour = stop.detour_miles.unwrap();
        assert!(detour > 30.0 && detour < 40.0, "got {detour}");
        assert_eq!(stop.total_cost, 155.0);
    }
}
