//! HTTP client for the health backend
//!
//! A thin pass-through over two endpoints:
//! - `GET /cells?lat=&lon=` returns every reading plus local news for a position
//! - `GET /geocode?query=` resolves free text (or `"lat,lon"`) to places
//!
//! The client performs no computation on the payloads. Transport and status
//! failures are mapped onto [`HealthExposureError`] so callers can tell a
//! timeout from a backend rejection.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::config::ApiConfig;
use crate::models::location::wire::GeocodeResponse;
use crate::models::{EnvironmentalSnapshot, SearchResult};
use crate::{HealthExposureError, Result};

pub const USER_AGENT: &str = concat!("health-exposure/", env!("CARGO_PKG_VERSION"));

/// Shortest query the geocoder is asked about
pub const MIN_QUERY_LEN: usize = 3;

/// Source of environmental snapshots and place lookups
#[async_trait]
pub trait EnvironmentSource: Send + Sync {
    async fn fetch_cells(&self, lat: f64, lon: f64) -> Result<EnvironmentalSnapshot>;

    async fn geocode(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Reject coordinates outside the WGS84 range
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(HealthExposureError::validation(format!(
            "Latitude {lat} is out of range (-90 to 90)"
        )));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(HealthExposureError::validation(format!(
            "Longitude {lon} is out of range (-180 to 180)"
        )));
    }
    Ok(())
}

pub struct HealthApiClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
    user_tier: String,
    timeout: Duration,
}

impl HealthApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HealthExposureError::config(format!("Failed to create HTTP client: {e}")))?;

        let mut builder = ClientBuilder::new(http);
        if config.max_retries > 0 {
            let policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
        }

        Ok(Self {
            client: builder.build(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            user_tier: config.user_tier.clone(),
            timeout: config.timeout(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self))]
    pub async fn fetch_cells(&self, lat: f64, lon: f64) -> Result<EnvironmentalSnapshot> {
        validate_coordinates(lat, lon)?;

        let url = format!("{}/cells?lat={}&lon={}", self.base_url, lat, lon);
        let started = Instant::now();
        let snapshot: EnvironmentalSnapshot = self.get_json(&url).await?;

        info!(
            "Fetched cell {} for ({:.4}, {:.4}) in {:.2}ms",
            snapshot.h3_cell.as_deref().unwrap_or("?"),
            lat,
            lon,
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    pub async fn geocode(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            debug!("Query '{}' too short, skipping geocode", query);
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/geocode?query={}",
            self.base_url,
            urlencoding::encode(query)
        );
        let started = Instant::now();
        let response: GeocodeResponse = self.get_json(&url).await?;
        let results: Vec<SearchResult> = response.results.into_iter().map(Into::into).collect();

        if results.is_empty() {
            warn!("No places found for '{}'", query);
        } else {
            info!(
                "Geocoded '{}' to {} result(s) in {:.2}ms",
                query,
                results.len(),
                started.elapsed().as_secs_f64() * 1000.0
            );
        }
        Ok(results)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut request = self
            .client
            .get(url)
            .header("x-user-tier", self.user_tier.as_str());
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key.as_str());
        }

        debug!("GET {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.reqwest_error(&e))?;

        if !status.is_success() {
            let message = backend_message(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!("Backend answered HTTP {}: {}", status.as_u16(), message);
            return Err(HealthExposureError::backend(status.as_u16(), message));
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!("Unparsable body from {}: {}", url, e);
            HealthExposureError::malformed(format!("Failed to parse backend response: {e}"))
        })
    }

    fn transport_error(&self, err: reqwest_middleware::Error) -> HealthExposureError {
        match err {
            reqwest_middleware::Error::Reqwest(e) => self.reqwest_error(&e),
            reqwest_middleware::Error::Middleware(e) => {
                HealthExposureError::network(format!("Request failed: {e}"))
            }
        }
    }

    fn reqwest_error(&self, err: &reqwest::Error) -> HealthExposureError {
        if err.is_timeout() {
            HealthExposureError::timeout(format!(
                "Request timed out after {}s",
                self.timeout.as_secs()
            ))
        } else {
            HealthExposureError::network(format!("Request failed: {err}"))
        }
    }
}

/// Error text from a `{"error": ...}` body, or the trimmed raw body
fn backend_message(body: &str) -> Option<String> {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .or_else(|| value.get("message"))
                .and_then(|e| e.as_str())
                .map(str::to_string)
        });

    from_json.or_else(|| {
        let trimmed = body.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[async_trait]
impl EnvironmentSource for HealthApiClient {
    async fn fetch_cells(&self, lat: f64, lon: f64) -> Result<EnvironmentalSnapshot> {
        HealthApiClient::fetch_cells(self, lat, lon).await
    }

    async fn geocode(&self, query: &str) -> Result<Vec<SearchResult>> {
        HealthApiClient::geocode(self, query).await
    }
}
