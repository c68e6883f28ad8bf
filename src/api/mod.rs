use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use crate::TripFuelError;
use crate::models::{CityState, TripPlan};
use crate::planner::TripPlanner;

const MISSING_PARAMETER: &str = "Missing 'start' or 'finish' parameter";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiLocation {
    pub city: String,
    pub state: String,
}

impl From<&CityState> for ApiLocation {
    fn from(location: &CityState) -> Self {
        Self {
            city: location.display_city(),
            state: location.state.clone(),
        }
    }
}

/// Error body `{"error": message}` with a status derived from the error kind
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<TripFuelError> for ApiError {
    fn from(err: TripFuelError) -> Self {
        let status = match &err {
            TripFuelError::Validation { .. } => StatusCode::BAD_REQUEST,
            TripFuelError::NotFound { .. } => StatusCode::NOT_FOUND,
            TripFuelError::RateLimited { .. } => StatusCode::SERVICE_UNAVAILABLE,
            TripFuelError::Api { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Trip request failed: {}", err);
        } else {
            warn!("Trip request rejected: {}", err);
        }

        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(planner: Arc<TripPlanner>) -> Router {
    Router::new()
        .route("/calculate_trip", get(calculate_trip))
        .route("/calculate_trip/", get(calculate_trip))
        .route("/locations", get(get_locations))
        .route("/locations/", get(get_locations))
        .with_state(planner)
}

async fn calculate_trip(
    State(planner): State<Arc<TripPlanner>>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<TripPlan>, ApiError> {
    // Repeated parameters keep their last value
    let Query(params) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let non_empty = |name: &str| params.get(name).filter(|v| !v.trim().is_empty());
    let (Some(start), Some(finish)) = (non_empty("start"), non_empty("finish")) else {
        return Err(ApiError::bad_request(MISSING_PARAMETER));
    };

    let plan = planner.plan(start, finish).await?;
    Ok(Json(plan))
}

async fn get_locations(State(planner): State<Arc<TripPlanner>>) -> Json<Vec<ApiLocation>> {
    Json(
        planner
            .available_locations()
            .iter()
            .map(ApiLocation::from)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use crate::config::{PlannerConfig, VehicleConfig};
    use crate::maps::MapsProvider;
    use crate::models::{Coordinates, Route};
    use crate::stations::StationCatalog;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    struct StubMaps;

    #[async_trait]
    impl MapsProvider for StubMaps {
        async fn directions(&self, origin: &str, destination: &str) -> Result<Route> {
            if destination.contains("Atlantis") {
                return Err(TripFuelError::not_found(format!(
                    "No route found from {origin} to {destination}"
                )));
            }
            if destination.contains("Quota") {
                return Err(TripFuelError::rate_limited("OVER_QUERY_LIMIT"));
            }
            Ok(Route {
                distance_miles: 300.0,
                duration_text: "4 hours 30 mins".to_string(),
                duration_seconds: 16_200,
                polyline: String::new(),
                waypoints: vec![
                    Coordinates::new(35.0, -97.0),
                    Coordinates::new(35.2, -101.8),
                ],
                start_address: origin.to_string(),
                end_address: destination.to_string(),
                summary: "I-40 W".to_string(),
            })
        }

        async fn reverse_geocode(&self, _point: &Coordinates) -> Result<Option<CityState>> {
            Ok(None)
        }

        async fn geocode(&self, _address: &str) -> Result<Option<Coordinates>> {
            Ok(None)
        }
    }

    fn app() -> Router {
        let csv = "Truckstop Name,City,State,Retail Price\n\
                   KWIK TRIP,Tomah,WI,3.28\n\
                   PILOT,Oklahoma City,OK,3.19\n";
        let catalog = StationCatalog::from_reader(csv.as_bytes()).unwrap();
        let planner = TripPlanner::new(
            Arc::new(StubMaps),
            Arc::new(catalog),
            &VehicleConfig::default(),
            &PlannerConfig::default(),
        );
        router(Arc::new(planner))
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_missing_parameter() {
        let (status, body) = get_json("/calculate_trip?start=Dallas").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": MISSING_PARAMETER }));

        let (status, _) = get_json("/calculate_trip/?start=Dallas&finish=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_repeated_parameter_uses_last_value() {
        let (status, body) =
            get_json("/calculate_trip?start=Nowhere&start=Tulsa&finish=Atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Tulsa"));
    }

    #[tokio::test]
    async fn test_calculate_trip() {
        let (status, body) =
            get_json("/calculate_trip?start=Oklahoma%20City%2C%20OK&finish=Amarillo%2C%20TX").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_distance_miles"], json!(300.0));
        assert_eq!(body["estimated_travel_time"], json!("4 hours 30 mins"));
        assert_eq!(body["total_fuel_gallons"], json!(30.0));
        assert_eq!(body["fuel_stops"], json!([]));
        assert_eq!(body["start_address"], json!("Oklahoma City, OK"));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (status, body) = get_json("/calculate_trip?start=Tulsa&finish=Atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("No route found"));

        let (status, _) = get_json("/calculate_trip?start=Tulsa&finish=Quota").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_locations() {
        let (status, body) = get_json("/locations/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                { "city": "Oklahoma City", "state": "OK" },
                { "city": "Tomah", "state": "WI" },
            ])
        );
    }
}
