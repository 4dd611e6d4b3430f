//! pinmap core
//!
//! Route geometry codec, memoized address lookups, and the Google Maps
//! Platform adapters behind the map screens.

pub mod config;
pub mod directions;
pub mod geocode;
pub mod haversine;
pub mod places;
pub mod polyline;
pub mod records;
pub mod resolver;
pub mod traits;
