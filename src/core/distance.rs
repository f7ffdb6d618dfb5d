use geo::{HaversineDistance, Point};
use crate::models::GeoPoint;

/// Meters in one statute mile
pub const METERS_PER_MILE: f64 = 1609.344;

/// Convert the UI's display unit (miles) to the search service's unit (meters)
#[inline]
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

#[inline]
pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

/// Great-circle distance between two points in miles
pub fn distance_miles(from: GeoPoint, to: GeoPoint) -> f64 {
    let a = Point::new(from.longitude, from.latitude);
    let b = Point::new(to.longitude, to.latitude);
    meters_to_miles(a.haversine_distance(&b))
}

/// Next search radius for the expansion stage, or `None` once the ceiling is reached
///
/// The radius grows geometrically by `growth` and is clamped to `ceiling`.
pub fn expanded_radius(current_miles: f64, growth: f64, ceiling_miles: f64) -> Option<f64> {
    if current_miles >= ceiling_miles {
        return None;
    }
    Some((current_miles * growth).min(ceiling_miles))
}
