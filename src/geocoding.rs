//! Google Geocoding API client
//!
//! Resolves postal addresses to coordinates. Lookups are cached in an
//! LRU keyed by the address so repeated imports of the same customer list
//! do not hit the API again.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lru::LruCache;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::traits::Geocoder;
use crate::utils::geo::GpsPoint;

const CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(size) => size,
    None => panic!("cache size must be non-zero"),
};

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: GpsPoint,
}

/// Extracts the first result's location from a geocoding reply
///
/// `ZERO_RESULTS` is not an error; it yields `None`.
///
/// # Errors
/// Returns an error for any other non-`OK` status or a malformed body.
pub fn parse_geocode_response(body: &str) -> Result<Option<GpsPoint>> {
    let response: GeocodeResponse =
        serde_json::from_str(body).context("Malformed geocoding response")?;

    match response.status.as_str() {
        "OK" => Ok(response.results.into_iter().next().map(|r| r.geometry.location)),
        "ZERO_RESULTS" => Ok(None),
        status => Err(anyhow!(
            "Geocoding failed with {}: {}",
            status,
            response.error_message.unwrap_or_default()
        )),
    }
}

/// Client for the Google Geocoding API
pub struct GoogleGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
    cache: Arc<Mutex<LruCache<String, Option<GpsPoint>>>>,
}

impl GoogleGeocoder {
    /// Creates a geocoder with a 100-entry cache
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(false)
            .use_rustls_tls()
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            cache: Arc::new(Mutex::new(LruCache::new(CACHE_SIZE))),
        })
    }

    async fn fetch(&self, address: &str) -> Result<Option<GpsPoint>> {
        let url = format!(
            "{}/maps/api/geocode/json",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .context("Failed to reach geocoding API")?;

        if response.status() != StatusCode::OK {
            return Err(anyhow!("Geocoding API returned HTTP {}", response.status()));
        }

        parse_geocode_response(&response.text().await?)
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn locate(&self, address: &str) -> Result<Option<GpsPoint>> {
        {
            let mut cache = self.cache.lock().await;
            if let Some(point) = cache.get(address) {
                return Ok(*point);
            }
        }

        let point = self.fetch(address).await?;

        self.cache.lock().await.put(address.to_string(), point);
        Ok(point)
    }
}

/// Looks up the coordinates of `address`
///
/// An empty address returns `None` without a request. Lookup errors are
/// logged and also return `None`.
pub async fn get_gps_from_address(geocoder: &dyn Geocoder, address: &str) -> Option<GpsPoint> {
    let address = address.trim();
    if address.is_empty() {
        return None;
    }

    match geocoder.locate(address).await {
        Ok(point) => point,
        Err(e) => {
            tracing::warn!(address, "Geocoding failed: {:#}", e);
            None
        }
    }
}
