use crate::ports::Geocoder;
use donorlink_core::error::{DonorlinkError, Result};
use donorlink_core::models::Coordinates;
use serde::Deserialize;
use std::time::Duration;

/// Nominatim (OpenStreetMap) geocoder
pub struct NominatimGeocoder {
    /// Base URL for the Nominatim API (e.g., "https://nominatim.openstreetmap.org")
    base_url: String,

    /// Upper bound on a single lookup
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,

    /// Runtime driving the async client from the blocking `resolve`
    runtime: tokio::runtime::Runtime,
}

impl NominatimGeocoder {
    /// Create a new Nominatim geocoder
    ///
    /// Nominatim's usage policy requires an identifying user agent.
    pub fn new(
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.into())
            .timeout(timeout)
            .build()
            .map_err(|e| DonorlinkError::GeocoderUnavailable {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DonorlinkError::GeocoderUnavailable {
                reason: format!("Failed to create async runtime: {}", e),
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
            runtime,
        })
    }

    /// Create against the public OpenStreetMap instance
    pub fn openstreetmap(user_agent: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::new(donorlink_core::config::DEFAULT_GEOCODER_URL, user_agent, timeout)
    }

    fn search_url(&self, location: &str) -> Result<reqwest::Url> {
        reqwest::Url::parse_with_params(
            &format!("{}/search", self.base_url),
            &[("q", location), ("format", "json"), ("limit", "1")],
        )
        .map_err(|e| DonorlinkError::GeocoderUnavailable {
            reason: format!("Invalid geocoder URL '{}': {}", self.base_url, e),
        })
    }

    fn transport_error(&self, location: &str, error: reqwest::Error) -> DonorlinkError {
        if error.is_timeout() {
            DonorlinkError::GeocodingTimeout {
                location: location.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            DonorlinkError::GeocoderUnavailable {
                reason: format!("Failed to reach {}: {}", self.base_url, error),
            }
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn resolve(&self, location: &str) -> Result<Coordinates> {
        let location = location.trim();
        if location.is_empty() {
            return Err(DonorlinkError::LocationNotFound { location: String::new() });
        }

        let url = self.search_url(location)?;
        tracing::debug!(%url, "geocoding location");

        let body = self.runtime.block_on(async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| self.transport_error(location, e))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                return Err(DonorlinkError::GeocoderUnavailable {
                    reason: format!("Nominatim API error ({}): {}", status, error_text),
                });
            }

            response.text().await.map_err(|e| self.transport_error(location, e))
        })?;

        parse_search_response(location, &body)
    }

    fn name(&self) -> &str {
        "nominatim"
    }
}

/// One place from the Nominatim `/search` JSON response
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Take the first place of a `/search?format=json` body
pub fn parse_search_response(location: &str, body: &str) -> Result<Coordinates> {
    let places: Vec<NominatimPlace> =
        serde_json::from_str(body).map_err(|e| DonorlinkError::GeocoderUnavailable {
            reason: format!("Failed to parse Nominatim response: {}", e),
        })?;

    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| DonorlinkError::LocationNotFound { location: location.to_string() })?;

    let parse = |value: &str| {
        value.parse::<f64>().map_err(|_| DonorlinkError::GeocoderUnavailable {
            reason: format!("Nominatim returned a non-numeric coordinate '{}'", value),
        })
    };
    let coordinates = Coordinates::new(parse(&place.lat)?, parse(&place.lon)?)?;

    tracing::debug!(
        location,
        display_name = place.display_name.as_deref().unwrap_or(""),
        latitude = coordinates.latitude,
        longitude = coordinates.longitude,
        "resolved location"
    );
    Ok(coordinates)
}
