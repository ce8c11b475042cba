//! Great-circle distance between two points

use crate::models::GeoPoint;

/// Haversine distance in kilometers on a sphere of radius 6371.0 km.
/// Symmetric, and zero for identical points.
#[must_use]
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: a.latitude,
            longitude: a.longitude,
        },
        haversine::Location {
            latitude: b.latitude,
            longitude: b.longitude,
        },
        haversine::Units::Kilometers,
    )
}
