//! Great-circle helpers for positions along a route

use crate::models::Coordinates;

/// Great-circle distance in miles
#[must_use]
pub fn distance_miles(from: &Coordinates, to: &Coordinates) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: from.latitude,
            longitude: from.longitude,
        },
        haversine::Location {
            latitude: to.latitude,
            longitude: to.longitude,
        },
        haversine::Units::Miles,
    )
}

/// Length of a polyline in miles
#[must_use]
pub fn path_length_miles(waypoints: &[Coordinates]) -> f64 {
    waypoints
        .windows(2)
        .map(|pair| distance_miles(&pair[0], &pair[1]))
        .sum()
}

/// Point reached after driving `miles` along the waypoints
///
/// Interpolates linearly inside the segment where the distance falls. Past the
/// end of the path the last waypoint is returned. `None` when fewer than two
/// waypoints are available.
#[must_use]
pub fn coordinates_at_distance(miles: f64, waypoints: &[Coordinates]) -> Option<Coordinates> {
    if waypoints.len() < 2 {
        return None;
    }

    let mut travelled = 0.0;
    for pair in waypoints.windows(2) {
        let step = distance_miles(&pair[0], &pair[1]);
        if step > 0.0 && travelled + step >= miles {
            let fraction = ((miles - travelled) / step).clamp(0.0, 1.0);
            return Some(Coordinates::new(
                pair[0].latitude + (pair[1].latitude - pair[0].latitude) * fraction,
                pair[0].longitude + (pair[1].longitude - pair[0].longitude) * fraction,
            ));
        }
        travelled += step;
    }

    waypoints.last().copied()
}

/// Closest waypoint to the given point
#[must_use]
pub fn nearest_waypoint(point: &Coordinates, waypoints: &[Coordinates]) -> Option<Coordinates> {
    waypoints
        .iter()
        .map(|waypoint| (distance_miles(point, waypoint), waypoint))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, waypoint)| *waypoint)
}

/// Mile markers at which the tank runs dry: every multiple of the range
/// strictly before the end of the trip
///
/// No stop is placed for the final leg: a marker at or past the destination
/// is omitted, so a trip exactly one range long needs no stop.
#[must_use]
pub fn stop_markers(total_miles: f64, range_miles: f64) -> Vec<f64> {
    if range_miles <= 0.0 {
        return Vec::new();
    }

    let mut markers = Vec::new();
    let mut marker = range_miles;
    while marker < total_miles {
        markers.push(marker);
        marker += range_miles;
    }
    markers
}
