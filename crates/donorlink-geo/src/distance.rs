use donorlink_core::models::{Coordinates, DistanceMethod};
use geo::{Distance, Geodesic, Haversine, Point};

fn to_point(coords: &Coordinates) -> Point {
    // geo points are (x, y) = (longitude, latitude)
    Point::new(coords.longitude, coords.latitude)
}

/// Distance in kilometers between two coordinates using the given method
pub fn distance_km(a: &Coordinates, b: &Coordinates, method: DistanceMethod) -> f64 {
    match method {
        DistanceMethod::Geodesic => geodesic_km(a, b),
        DistanceMethod::Haversine => haversine_km(a, b),
    }
}

/// Shortest distance on the WGS 84 ellipsoid, in kilometers
pub fn geodesic_km(a: &Coordinates, b: &Coordinates) -> f64 {
    if a == b {
        return 0.0;
    }
    Geodesic.distance(to_point(a), to_point(b)) / 1000.0
}

/// Great-circle distance on a sphere of mean Earth radius, in kilometers
pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    if a == b {
        return 0.0;
    }
    Haversine.distance(to_point(a), to_point(b)) / 1000.0
}
