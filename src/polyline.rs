//! Route geometry decoding
//!
//! Google returns route geometry as an encoded polyline with five decimal
//! digits of precision.

use crate::models::Coordinates;
use crate::{Result, TripFuelError};

const PRECISION: u32 = 5;

/// Decode an encoded polyline into its vertices
pub fn decode(encoded: &str) -> Result<Vec<Coordinates>> {
    let line = ::polyline::decode_polyline(encoded, PRECISION)
        .map_err(|e| TripFuelError::api(format!("Invalid route polyline: {e}")))?;

    let points: Vec<Coordinates> = line
        .0
        .into_iter()
        .map(|coord| Coordinates::new(coord.y, coord.x))
        .collect();

    if let Some(index) = points.iter().position(|point| !point.is_valid()) {
        return Err(TripFuelError::api(format!(
            "Polyline produced an out of range coordinate at vertex {index}"
        )));
    }

    Ok(points)
}
