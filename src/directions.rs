//! Google Routes API adapter for driving directions.
//!
//! Requests only the encoded polyline of each route through the field mask;
//! decoding happens in [`crate::polyline`].

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, MapsConfig};
use crate::polyline::PolylineError;
use crate::traits::DirectionsProvider;

const FIELD_MASK: &str = "routes.polyline.encodedPolyline";

#[derive(Debug, Error)]
pub enum DirectionsError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("directions request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directions API returned HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("invalid directions response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("route geometry is malformed: {0}")]
    Polyline(#[from] PolylineError),
}

#[derive(Debug, Clone)]
pub struct DirectionsClient {
    config: MapsConfig,
    client: reqwest::Client,
}

impl DirectionsClient {
    pub fn new(config: MapsConfig) -> Result<Self, DirectionsError> {
        config.api_key()?;
        let client = config.http_client()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl DirectionsProvider for DirectionsClient {
    type Error = DirectionsError;

    async fn encoded_routes(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
        alternatives: bool,
    ) -> Result<Vec<String>, Self::Error> {
        let api_key = self.config.api_key()?;
        debug!(?origin, ?destination, alternatives, "requesting driving route");

        let response = self
            .client
            .post(self.config.routes_url.as_str())
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&ComputeRoutesRequest::drive(origin, destination, alternatives))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let message = error_message(&body);
            warn!(%status, %message, "routes API call failed");
            return Err(DirectionsError::Status { status, message });
        }

        parse_routes(&body)
    }
}

/// Extracts the non-empty encoded polylines from a `computeRoutes` body.
pub(crate) fn parse_routes(body: &[u8]) -> Result<Vec<String>, DirectionsError> {
    let decoded: ComputeRoutesResponse = serde_json::from_slice(body)?;
    Ok(decoded
        .routes
        .into_iter()
        .filter_map(|route| route.polyline?.encoded_polyline)
        .filter(|encoded| !encoded.is_empty())
        .collect())
}

/// Google APIs report failures as `{"error": {"message": ...}}`.
pub(crate) fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|response| response.error?.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| "no error message".to_string())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComputeRoutesRequest {
    origin: Waypoint,
    destination: Waypoint,
    travel_mode: &'static str,
    routing_preference: &'static str,
    compute_alternative_routes: bool,
}

impl ComputeRoutesRequest {
    fn drive(origin: (f64, f64), destination: (f64, f64), alternatives: bool) -> Self {
        Self {
            origin: Waypoint::at(origin),
            destination: Waypoint::at(destination),
            travel_mode: "DRIVE",
            routing_preference: "TRAFFIC_AWARE",
            compute_alternative_routes: alternatives,
        }
    }
}

#[derive(Debug, Serialize)]
struct Waypoint {
    location: WaypointLocation,
}

impl Waypoint {
    fn at((latitude, longitude): (f64, f64)) -> Self {
        Self {
            location: WaypointLocation {
                lat_lng: LatLng {
                    latitude,
                    longitude,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WaypointLocation {
    lat_lng: LatLng,
}

#[derive(Debug, Serialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ComputeRoutesResponse {
    #[serde(default)]
    routes: Vec<RouteDto>,
}

#[derive(Debug, Deserialize)]
struct RouteDto {
    polyline: Option<PolylineDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolylineDto {
    encoded_polyline: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ComputeRoutesRequest::drive(
            (38.5, -120.2),
            (40.7, -120.95),
            false,
        ))
        .unwrap();

        assert_eq!(
            body,
            json!({
                "origin": {"location": {"latLng": {"latitude": 38.5, "longitude": -120.2}}},
                "destination": {"location": {"latLng": {"latitude": 40.7, "longitude": -120.95}}},
                "travelMode": "DRIVE",
                "routingPreference": "TRAFFIC_AWARE",
                "computeAlternativeRoutes": false
            })
        );
    }

    #[test]
    fn test_parse_routes() {
        let body = br#"{"routes":[{"polyline":{"encodedPolyline":"_p~iF~ps|U"}},{"polyline":{}},{"polyline":{"encodedPolyline":""}},{"polyline":{"encodedPolyline":"??"}}]}"#;
        assert_eq!(parse_routes(body).unwrap(), vec!["_p~iF~ps|U", "??"]);
    }

    #[test]
    fn test_parse_routes_without_routes() {
        assert!(parse_routes(b"{}").unwrap().is_empty());
        assert!(parse_routes(br#"{"routes":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_routes_rejects_garbage() {
        assert!(matches!(parse_routes(b"<html>"), Err(DirectionsError::Decode(_))));
    }

    #[test]
    fn test_error_message() {
        let body = br#"{"error":{"code":403,"message":"API key not valid."}}"#;
        assert_eq!(error_message(body), "API key not valid.");
        assert_eq!(error_message(b"oops"), "no error message");
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = DirectionsClient::new(MapsConfig::default());
        assert!(matches!(
            result,
            Err(DirectionsError::Config(ConfigError::MissingApiKey))
        ));
    }
}
