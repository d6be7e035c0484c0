//! Geocoding adapter.
//!
//! Resolves a free-text place name to coordinates through the Mapbox
//! forward-geocoding endpoint. The HTTP call and the response parsing are
//! separated so the parsing can be tested against canned payloads.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use geosense_types::Location;

const MAPBOX_BASE_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Result type for geocoding operations.
pub type Result<T> = std::result::Result<T, GeocodeError>;

/// Errors from the geocoding lookup.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// The upstream returned no usable feature for the place name.
    #[error("location not found")]
    NotFound,

    /// The upstream call itself failed.
    #[error("geocoding request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// Resolves place names to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn find_lat_lon(&self, place: &str) -> Result<Location>;
}

/// Mapbox-backed geocoder.
pub struct MapboxGeocoder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl MapboxGeocoder {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: MAPBOX_BASE_URL.to_string(),
        }
    }

    /// Point the geocoder at a different endpoint (test servers).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn find_lat_lon(&self, place: &str) -> Result<Location> {
        let url = format!(
            "{}/{}.json",
            self.base_url.trim_end_matches('/'),
            encode_path_segment(place)
        );
        debug!(place, "geocoding place name");

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        parse_geocode_response(&body)
    }
}

/// Extract `{lat, lon}` from a Mapbox forward-geocoding response.
///
/// The upstream orders coordinates longitude first. An empty or malformed
/// feature list is reported as not-found rather than an upstream failure.
pub fn parse_geocode_response(body: &Value) -> Result<Location> {
    let center = body
        .get("features")
        .and_then(Value::as_array)
        .and_then(|features| features.first())
        .and_then(|feature| feature.get("center"))
        .and_then(Value::as_array)
        .ok_or(GeocodeError::NotFound)?;

    match center.as_slice() {
        [lon, lat] => {
            let lon = lon.as_f64().ok_or(GeocodeError::NotFound)?;
            let lat = lat.as_f64().ok_or(GeocodeError::NotFound)?;
            Ok(Location::new(lat, lon))
        }
        _ => Err(GeocodeError::NotFound),
    }
}

/// Percent-encode a single path segment.
fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}
