//! Settings shared by the Google Maps Platform adapters.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_ROUTES_URL: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";
pub const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const DEFAULT_PLACES_URL: &str = "https://places.googleapis.com/v1/places:searchNearby";

pub const API_KEY_VAR: &str = "MAPS_API_KEY";
pub const TIMEOUT_VAR: &str = "MAPS_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("maps API key is missing (set {API_KEY_VAR})")]
    MissingApiKey,
    #[error("invalid {TIMEOUT_VAR} value {value:?}")]
    InvalidTimeout { value: String },
}

#[derive(Debug, Clone)]
pub struct MapsConfig {
    pub api_key: String,
    pub routes_url: String,
    pub geocode_url: String,
    pub places_url: String,
    pub timeout_secs: u64,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            routes_url: DEFAULT_ROUTES_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            places_url: DEFAULT_PLACES_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl MapsConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Reads `MAPS_API_KEY` (required) and `MAPS_TIMEOUT_SECS` (optional).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::with_api_key(lookup(API_KEY_VAR).unwrap_or_default());
        config.api_key()?;

        if let Some(value) = lookup(TIMEOUT_VAR) {
            config.timeout_secs = value
                .trim()
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout { value })?;
        }

        Ok(config)
    }

    /// The API key, rejected before any request is made when blank.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            Err(ConfigError::MissingApiKey)
        } else {
            Ok(key)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout())
            .user_agent(concat!("pinmap/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}
