//! Shared fixtures for the integration tests.
//!
//! - A short driving route along the Las Vegas Strip (7-decimal OSM points)
//! - Helpers for rounding coordinates to polyline precision

pub mod strip_route;

pub use strip_route::*;

/// Rounds a coordinate to the 5 decimal places the polyline format keeps.
pub fn round5(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

pub fn rounded(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|&(lat, lng)| (round5(lat), round5(lng)))
        .collect()
}
