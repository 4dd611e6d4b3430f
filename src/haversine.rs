//! Great-circle distance between coordinates.
//!
//! Used to order nearby places and to filter alerts around a point. Treats
//! the earth as a sphere, which is plenty for map markers a few km apart.

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two (lat, lng) points in kilometers.
pub fn distance_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

pub fn distance_meters(from: (f64, f64), to: (f64, f64)) -> f64 {
    distance_km(from, to) * 1000.0
}

/// Whether `point` lies within `radius_meters` of `center`.
pub fn within_radius(center: (f64, f64), point: (f64, f64), radius_meters: f64) -> bool {
    distance_meters(center, point) <= radius_meters
}
