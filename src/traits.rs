//! Collaborator interfaces for the map core.
//!
//! These describe the remote services the application talks to. The HTTP
//! adapters in this crate implement them; tests and other backends can
//! provide their own.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::places::{PlaceCategory, PlaceMarker};
use crate::polyline::{self, Polyline, PolylineError};
use crate::records::RecordError;

/// Returns driving routes between two coordinates as encoded polylines.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    type Error: std::error::Error + From<PolylineError> + Send + Sync + 'static;

    /// Encoded polylines of the returned routes, primary route first.
    ///
    /// An empty vector means the provider found no route.
    async fn encoded_routes(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
        alternatives: bool,
    ) -> Result<Vec<String>, Self::Error>;

    /// Decoded primary route, or `None` when no route exists.
    async fn route(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
    ) -> Result<Option<Polyline>, Self::Error> {
        let routes = self.encoded_routes(origin, destination, false).await?;
        match routes.first() {
            Some(encoded) => Ok(Some(Polyline::decode(encoded)?)),
            None => Ok(None),
        }
    }

    /// Decoded primary route followed by any alternatives.
    async fn route_alternatives(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
    ) -> Result<Vec<Polyline>, Self::Error> {
        let routes = self.encoded_routes(origin, destination, true).await?;
        polyline::decode_all(routes.as_slice())
            .into_iter()
            .map(|decoded| decoded.map_err(Self::Error::from))
            .collect()
    }
}

/// Turns a coordinate into a human-readable address.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `Ok(None)` when the provider has no address for the position.
    async fn reverse_geocode(&self, position: (f64, f64)) -> Result<Option<String>, Self::Error>;
}

/// Searches for points of interest around a center point.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn search_nearby(
        &self,
        center: (f64, f64),
        radius_meters: f64,
        category: PlaceCategory,
    ) -> Result<Vec<PlaceMarker>, Self::Error>;
}

/// A stored document addressed by an opaque string id.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;

    /// Returns the record with its id replaced. Stores call this on create.
    fn with_id(self, id: String) -> Self;
}

/// Create/read/update/delete over one collection, with live snapshots.
///
/// Every successful mutation publishes the full collection to subscribers.
#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    /// Stores a new record and returns its assigned id.
    async fn create(&self, record: T) -> Result<String, RecordError>;

    async fn get(&self, id: &str) -> Result<Option<T>, RecordError>;

    async fn list(&self) -> Result<Vec<T>, RecordError>;

    /// Replaces the stored record that has the same id.
    async fn update(&self, record: T) -> Result<(), RecordError>;

    async fn delete(&self, id: &str) -> Result<(), RecordError>;

    /// Receiver that always holds the latest full snapshot.
    fn subscribe(&self) -> watch::Receiver<Arc<Vec<T>>>;
}
