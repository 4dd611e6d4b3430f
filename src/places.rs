//! Nearby points of interest via the Google Places API (`searchNearby`).

use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, MapsConfig};
use crate::directions::error_message;
use crate::haversine::distance_km;
use crate::traits::PlacesProvider;

const FIELD_MASK: &str = "places.displayName,places.location";
const MAX_RESULTS: u32 = 20;
const UNNAMED_PLACE: &str = "Unknown";

/// Default search radius used by the map screen.
pub const DEFAULT_RADIUS_METERS: f64 = 3000.0;

/// Point of interest categories shown as marker layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceCategory {
    Gym,
    Games,
    Pizza,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 3] = [Self::Gym, Self::Games, Self::Pizza];

    /// Places API `includedTypes` value searched for this category.
    pub fn included_type(self) -> &'static str {
        match self {
            Self::Gym => "gym",
            Self::Games => "electronics_store",
            Self::Pizza => "restaurant",
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Gym => "gym",
            Self::Games => "games",
            Self::Pizza => "pizza",
        };
        f.write_str(label)
    }
}

/// A place returned by a nearby search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceMarker {
    pub name: String,
    /// (latitude, longitude)
    pub position: (f64, f64),
    pub category: PlaceCategory,
}

#[derive(Debug, Error)]
pub enum PlacesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("places request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("places API returned HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("invalid places response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("search radius must be positive, got {0}")]
    InvalidRadius(f64),
}

#[derive(Debug, Clone)]
pub struct PlacesClient {
    config: MapsConfig,
    client: reqwest::Client,
}

impl PlacesClient {
    pub fn new(config: MapsConfig) -> Result<Self, PlacesError> {
        config.api_key()?;
        let client = config.http_client()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl PlacesProvider for PlacesClient {
    type Error = PlacesError;

    async fn search_nearby(
        &self,
        center: (f64, f64),
        radius_meters: f64,
        category: PlaceCategory,
    ) -> Result<Vec<PlaceMarker>, Self::Error> {
        if !(radius_meters.is_finite() && radius_meters > 0.0) {
            return Err(PlacesError::InvalidRadius(radius_meters));
        }
        let api_key = self.config.api_key()?;
        debug!(?center, radius_meters, %category, "searching nearby places");

        let response = self
            .client
            .post(self.config.places_url.as_str())
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&SearchNearbyRequest::new(center, radius_meters, category))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let message = error_message(&body);
            warn!(%status, %message, %category, "places API call failed");
            return Err(PlacesError::Status { status, message });
        }

        parse_places(&body, center, category)
    }
}

/// Builds markers from a `searchNearby` body, nearest to `center` first.
///
/// Places without a usable location are skipped.
pub(crate) fn parse_places(
    body: &[u8],
    center: (f64, f64),
    category: PlaceCategory,
) -> Result<Vec<PlaceMarker>, PlacesError> {
    let decoded: SearchNearbyResponse = serde_json::from_slice(body)?;

    let mut markers: Vec<(f64, PlaceMarker)> = decoded
        .places
        .into_iter()
        .filter_map(|place| {
            let location = place.location?;
            let position = (location.latitude?, location.longitude?);
            if !(position.0.is_finite() && position.1.is_finite()) {
                return None;
            }
            let name = place
                .display_name
                .and_then(|name| name.text)
                .unwrap_or_else(|| UNNAMED_PLACE.to_string());
            Some((
                distance_km(center, position),
                PlaceMarker {
                    name,
                    position,
                    category,
                },
            ))
        })
        .collect();

    markers.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(markers.into_iter().map(|(_, marker)| marker).collect())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchNearbyRequest {
    included_types: [&'static str; 1],
    max_result_count: u32,
    location_restriction: LocationRestriction,
}

impl SearchNearbyRequest {
    fn new((latitude, longitude): (f64, f64), radius: f64, category: PlaceCategory) -> Self {
        Self {
            included_types: [category.included_type()],
            max_result_count: MAX_RESULTS,
            location_restriction: LocationRestriction {
                circle: Circle {
                    center: LatLng {
                        latitude: Some(latitude),
                        longitude: Some(longitude),
                    },
                    radius,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct LocationRestriction {
    circle: Circle,
}

#[derive(Debug, Serialize)]
struct Circle {
    center: LatLng,
    radius: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct LatLng {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SearchNearbyResponse {
    #[serde(default)]
    places: Vec<PlaceDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceDto {
    display_name: Option<DisplayName>,
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct DisplayName {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STRIP: (f64, f64) = (36.1147, -115.1728);

    #[test]
    fn test_included_types() {
        let types: Vec<_> = PlaceCategory::ALL
            .iter()
            .map(|category| category.included_type())
            .collect();
        assert_eq!(types, vec!["gym", "electronics_store", "restaurant"]);
    }

    #[test]
    fn test_request_body_shape() {
        let body =
            serde_json::to_value(SearchNearbyRequest::new(STRIP, 3000.0, PlaceCategory::Pizza))
                .unwrap();
        assert_eq!(
            body,
            json!({
                "includedTypes": ["restaurant"],
                "maxResultCount": 20,
                "locationRestriction": {
                    "circle": {
                        "center": {"latitude": 36.1147, "longitude": -115.1728},
                        "radius": 3000.0
                    }
                }
            })
        );
    }

    #[test]
    fn test_parse_places_sorts_by_distance_and_skips_unlocated() {
        let body = json!({
            "places": [
                {"displayName": {"text": "Far Gym"}, "location": {"latitude": 36.2, "longitude": -115.2}},
                {"displayName": {"text": "No Location"}},
                {"location": {"latitude": 36.115, "longitude": -115.173}},
                {"displayName": {"text": "Half"}, "location": {"latitude": 36.1}}
            ]
        })
        .to_string();

        let markers = parse_places(body.as_bytes(), STRIP, PlaceCategory::Gym).unwrap();
        let names: Vec<_> = markers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Unknown", "Far Gym"]);
        assert!(markers.iter().all(|m| m.category == PlaceCategory::Gym));
        assert_eq!(markers[1].position, (36.2, -115.2));
    }

    #[test]
    fn test_parse_places_empty_body() {
        assert!(parse_places(b"{}", STRIP, PlaceCategory::Games).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_bad_radius() {
        let client = PlacesClient::new(MapsConfig::with_api_key("key")).unwrap();
        let result = client.search_nearby(STRIP, 0.0, PlaceCategory::Gym).await;
        assert!(matches!(result, Err(PlacesError::InvalidRadius(_))));
    }
}
