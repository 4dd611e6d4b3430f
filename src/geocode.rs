//! Reverse geocoding through the Google Geocoding API, plus the memoized
//! address lookup used for favorites.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, MapsConfig};
use crate::directions::error_message;
use crate::records::FavoriteLocation;
use crate::resolver::{MemoizedResolver, ResolverConfig};
use crate::traits::ReverseGeocoder;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoding API returned HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("geocoding API reported {status}: {message}")]
    Api { status: String, message: String },
    #[error("invalid geocoding response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    config: MapsConfig,
    client: reqwest::Client,
}

impl GeocodingClient {
    pub fn new(config: MapsConfig) -> Result<Self, GeocodeError> {
        config.api_key()?;
        let client = config.http_client()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl ReverseGeocoder for GeocodingClient {
    type Error = GeocodeError;

    async fn reverse_geocode(&self, position: (f64, f64)) -> Result<Option<String>, Self::Error> {
        let api_key = self.config.api_key()?;
        let (lat, lng) = position;
        debug!(lat, lng, "reverse geocoding");

        let response = self
            .client
            .get(self.config.geocode_url.as_str())
            .query(&[("latlng", format!("{lat},{lng}")), ("key", api_key.to_string())])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let message = error_message(&body);
            warn!(%status, %message, "geocoding API call failed");
            return Err(GeocodeError::Status { status, message });
        }

        parse_address(&body)
    }
}

/// First result's `formatted_address`, or `None` for an empty result set.
pub(crate) fn parse_address(body: &[u8]) -> Result<Option<String>, GeocodeError> {
    let decoded: GeocodeResponse = serde_json::from_slice(body)?;
    match decoded.status.as_deref() {
        None | Some("OK") | Some("ZERO_RESULTS") => {}
        Some(status) => {
            return Err(GeocodeError::Api {
                status: status.to_string(),
                message: decoded
                    .error_message
                    .unwrap_or_else(|| "no error message".to_string()),
            });
        }
    }

    Ok(decoded
        .results
        .into_iter()
        .next()
        .and_then(|result| result.formatted_address)
        .filter(|address| !address.is_empty()))
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: Option<String>,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: Option<String>,
}

/// Human-readable addresses for favorites, fetched once per favorite id.
///
/// A failed or empty lookup is remembered and reported as
/// [`UNKNOWN_LOCATION`](crate::resolver::UNKNOWN_LOCATION) until the
/// favorite is forgotten.
pub struct FavoriteAddresses<G> {
    geocoder: G,
    cache: MemoizedResolver<String>,
}

impl<G: ReverseGeocoder> FavoriteAddresses<G> {
    pub fn new(geocoder: G) -> Self {
        Self::with_config(geocoder, ResolverConfig::default())
    }

    pub fn with_config(geocoder: G, config: ResolverConfig) -> Self {
        Self {
            geocoder,
            cache: MemoizedResolver::with_config(config),
        }
    }

    pub async fn address_for(&self, favorite: &FavoriteLocation) -> String {
        let position = favorite.position;
        self.cache
            .resolve_or_unknown(&favorite.id, |_| self.geocoder.reverse_geocode(position))
            .await
    }

    /// Drops the cached address, e.g. after the favorite was deleted.
    pub fn forget(&self, id: &str) {
        self.cache.invalidate(id);
    }

    pub fn cache(&self) -> &MemoizedResolver<String> {
        &self.cache
    }
}
