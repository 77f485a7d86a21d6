//! Location Resolution Module
//!
//! Turns user input or a device position into a named [`Location`]. Positions
//! come from a [`PositionProvider`]; names come from the backend geocoder, with
//! a coordinate label as the fallback when reverse geocoding yields nothing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::api::{EnvironmentSource, USER_AGENT, validate_coordinates};
use crate::config::LocateConfig;
use crate::models::{Location, SearchResult};
use crate::{HealthExposureError, Result};

/// A raw position without a name
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

/// Types of location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Coordinates (latitude, longitude)
    Coordinates(f64, f64),
    /// Free text for the geocoder
    Query(String),
}

impl LocationInput {
    /// Parse `"lat,lon"`, `"lat lon"` or free text
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(HealthExposureError::validation("Location must not be empty"));
        }

        Ok(match Self::parse_coordinates(input) {
            Some((lat, lon)) => LocationInput::Coordinates(lat, lon),
            None => LocationInput::Query(input.to_string()),
        })
    }

    fn parse_coordinates(input: &str) -> Option<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        let [lat, lon] = parts.as_slice() else {
            return None;
        };
        let lat = lat.parse::<f64>().ok()?;
        let lon = lon.parse::<f64>().ok()?;

        validate_coordinates(lat, lon).ok().map(|()| (lat, lon))
    }
}

/// Source of the device's current position
#[async_trait]
pub trait PositionProvider: Send + Sync {
    async fn current_position(&self) -> Result<Position>;
}

/// A position set in configuration or on the command line
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Position);

impl FixedPosition {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self(Position { lat, lon })
    }
}

#[async_trait]
impl PositionProvider for FixedPosition {
    async fn current_position(&self) -> Result<Position> {
        Ok(self.0)
    }
}

/// `ip-api.com` style lookup response
#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

/// Approximate position from the public IP address
pub struct IpGeolocation {
    client: reqwest::Client,
    url: String,
}

impl IpGeolocation {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HealthExposureError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PositionProvider for IpGeolocation {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn current_position(&self) -> Result<Position> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| HealthExposureError::location_unavailable(format!("IP lookup failed: {e}")))?;

        let lookup: IpLookupResponse = response.json().await.map_err(|e| {
            HealthExposureError::location_unavailable(format!("Unreadable IP lookup response: {e}"))
        })?;

        match lookup.status.as_str() {
            "success" => {}
            "fail" | "denied" => {
                return Err(HealthExposureError::permission_denied(
                    lookup
                        .message
                        .unwrap_or_else(|| "IP lookup refused".to_string()),
                ));
            }
            other => {
                return Err(HealthExposureError::location_unavailable(format!(
                    "Unexpected IP lookup status '{other}'"
                )));
            }
        }

        let (lat, lon) = lookup.lat.zip(lookup.lon).ok_or_else(|| {
            HealthExposureError::location_unavailable("IP lookup returned no coordinates")
        })?;

        debug!("IP lookup placed device at ({:.4}, {:.4})", lat, lon);
        Ok(Position { lat, lon })
    }
}

/// Pick the position provider for the current run
pub fn position_provider(
    config: &LocateConfig,
    override_position: Option<(f64, f64)>,
) -> Result<Box<dyn PositionProvider>> {
    match override_position.or_else(|| config.fixed_position()) {
        Some((lat, lon)) => {
            validate_coordinates(lat, lon)?;
            Ok(Box::new(FixedPosition::new(lat, lon)))
        }
        None => Ok(Box::new(IpGeolocation::new(config.ip_lookup_url.clone())?)),
    }
}

/// Service for resolving location inputs
pub struct LocationResolver<S> {
    source: Arc<S>,
    provider: Box<dyn PositionProvider>,
    timeout: Duration,
}

impl<S: EnvironmentSource> LocationResolver<S> {
    pub fn new(source: Arc<S>, provider: Box<dyn PositionProvider>, timeout: Duration) -> Self {
        Self {
            source,
            provider,
            timeout,
        }
    }

    /// Named location for the device position
    #[instrument(skip(self))]
    pub async fn current_location(&self) -> Result<Location> {
        let position = self.locate().await?;
        Ok(self.name_position(position).await)
    }

    /// Resolve user input into a structured Location
    #[instrument(skip(self))]
    pub async fn resolve(&self, input: &str) -> Result<Location> {
        let location = match LocationInput::parse(input)? {
            LocationInput::Coordinates(lat, lon) => {
                self.name_position(Position { lat, lon }).await
            }
            LocationInput::Query(query) => {
                let first = self.source.geocode(&query).await?.into_iter().next();
                first.map(Location::from).ok_or_else(|| {
                    HealthExposureError::location_unavailable(format!(
                        "No place found for '{query}'"
                    ))
                })?
            }
        };

        info!(
            "Resolved '{}' to {} ({})",
            input.trim(),
            location.name,
            location.format_coordinates()
        );
        Ok(location)
    }

    /// All geocoder matches for a query
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.source.geocode(query).await
    }

    async fn locate(&self) -> Result<Position> {
        let position = tokio::time::timeout(self.timeout, self.provider.current_position())
            .await
            .map_err(|_| HealthExposureError::timeout("Location request timed out."))??;

        validate_coordinates(position.lat, position.lon).map_err(|e| {
            HealthExposureError::location_unavailable(format!("Provider gave a bad position: {e}"))
        })?;
        Ok(position)
    }

    /// Reverse geocode, falling back to a coordinate label
    async fn name_position(&self, position: Position) -> Location {
        let Position { lat, lon } = position;
        let query = format!("{lat},{lon}");

        match self.source.geocode(&query).await {
            Ok(results) => match results.into_iter().next() {
                Some(result) => Location::new(result.location.name, lat, lon),
                None => {
                    debug!("No reverse geocoding results, using coordinates as name");
                    Location::from_coordinates(lat, lon)
                }
            },
            Err(e) => {
                warn!("Reverse geocoding failed: {}, using coordinates as name", e);
                Location::from_coordinates(lat, lon)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnvironmentalSnapshot;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGeocoder {
        results: Vec<SearchResult>,
        fail: bool,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EnvironmentSource for FakeGeocoder {
        async fn fetch_cells(&self, _lat: f64, _lon: f64) -> Result<EnvironmentalSnapshot> {
            Ok(EnvironmentalSnapshot::default())
        }

        async fn geocode(&self, query: &str) -> Result<Vec<SearchResult>> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(HealthExposureError::network("down"));
            }
            Ok(self.results.clone())
        }
    }

    struct StalledProvider;

    #[async_trait]
    impl PositionProvider for StalledProvider {
        async fn current_position(&self) -> Result<Position> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Position { lat: 0.0, lon: 0.0 })
        }
    }

    fn place(name: &str, lat: f64, lon: f64) -> SearchResult {
        SearchResult {
            location: Location::new(name, lat, lon),
            street: None,
            city: None,
            region: None,
            country: None,
        }
    }

    fn resolver(
        geocoder: FakeGeocoder,
        provider: Box<dyn PositionProvider>,
    ) -> LocationResolver<FakeGeocoder> {
        LocationResolver::new(Arc::new(geocoder), provider, Duration::from_secs(10))
    }

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(
            LocationInput::parse("46.8182,8.2275").unwrap(),
            LocationInput::Coordinates(46.8182, 8.2275)
        );
        assert_eq!(
            LocationInput::parse(" -33.86 151.21 ").unwrap(),
            LocationInput::Coordinates(-33.86, 151.21)
        );
    }

    #[test]
    fn test_parse_falls_back_to_query() {
        for input in ["91.0,8.0", "46.0", "46.0,8.0,0.0", "Helsinki"] {
            assert!(matches!(
                LocationInput::parse(input).unwrap(),
                LocationInput::Query(_)
            ));
        }
        assert!(LocationInput::parse("   ").is_err());
    }

    #[tokio::test]
    async fn test_current_location_is_reverse_geocoded() {
        let geocoder = FakeGeocoder {
            results: vec![place("Kamppi, Helsinki", 60.17, 24.93)],
            ..Default::default()
        };
        let resolver = resolver(geocoder, Box::new(FixedPosition::new(60.1699, 24.9384)));

        let location = resolver.current_location().await.unwrap();

        assert_eq!(location.name, "Kamppi, Helsinki");
        // device coordinates win over the geocoder's
        assert_eq!(location.lat, 60.1699);
        assert_eq!(
            resolver.source.queries.lock().unwrap().as_slice(),
            ["60.1699,24.9384"]
        );
    }

    #[tokio::test]
    async fn test_reverse_geocode_failure_falls_back_to_coordinates() {
        let geocoder = FakeGeocoder {
            fail: true,
            ..Default::default()
        };
        let resolver = resolver(geocoder, Box::new(FixedPosition::new(46.8182, 8.2275)));

        let location = resolver.current_location().await.unwrap();
        assert_eq!(location.name, "Location (46.8182, 8.2275)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_provider_times_out() {
        let resolver = resolver(FakeGeocoder::default(), Box::new(StalledProvider));

        let err = resolver.current_location().await.unwrap_err();
        assert!(matches!(err, HealthExposureError::Timeout { .. }));
        assert_eq!(err.user_message(), "Location request timed out.");
    }

    #[tokio::test]
    async fn test_resolve_query_takes_first_result() {
        let geocoder = FakeGeocoder {
            results: vec![place("Paris, France", 48.85, 2.35), place("Paris, Texas", 33.66, -95.55)],
            ..Default::default()
        };
        let resolver = resolver(geocoder, Box::new(FixedPosition::new(0.0, 0.0)));

        let location = resolver.resolve("Paris").await.unwrap();
        assert_eq!(location.name, "Paris, France");
        assert_eq!(resolver.search("Paris").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_query_without_results() {
        let resolver = resolver(FakeGeocoder::default(), Box::new(FixedPosition::new(0.0, 0.0)));

        let err = resolver.resolve("Atlantis").await.unwrap_err();
        assert!(matches!(err, HealthExposureError::LocationUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_ip_lookup_denied() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/json");
                then.status(200)
                    .json_body(serde_json::json!({"status": "fail", "message": "reserved range"}));
            })
            .await;

        let provider = IpGeolocation::new(server.url("/json")).unwrap();
        let err = provider.current_position().await.unwrap_err();
        assert!(matches!(err, HealthExposureError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_ip_lookup_success() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/json");
                then.status(200).json_body(
                    serde_json::json!({"status": "success", "lat": 52.52, "lon": 13.405}),
                );
            })
            .await;

        let provider = IpGeolocation::new(server.url("/json")).unwrap();
        let position = provider.current_position().await.unwrap();
        assert_eq!(position, Position { lat: 52.52, lon: 13.405 });
    }
}
