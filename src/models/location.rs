//! Location model for named coordinates and geocoding results

use serde::{Deserialize, Serialize};

/// A place the dashboard shows data for
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Display name (city, region, etc.)
    pub name: String,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }

    /// Name a bare coordinate pair, used when no place name can be found
    #[must_use]
    pub fn from_coordinates(lat: f64, lon: f64) -> Self {
        Self::new(format!("Location ({lat:.4}, {lon:.4})"), lat, lon)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }

    /// Header text for the dashboard
    #[must_use]
    pub fn display_label(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Lat: {:.3}, Lon: {:.3}", self.lat, self.lon)
        } else {
            self.name.clone()
        }
    }
}

/// A candidate returned by a location search
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchResult {
    pub location: Location,
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl From<SearchResult> for Location {
    fn from(result: SearchResult) -> Self {
        result.location
    }
}

/// `/geocode` response structures
pub(crate) mod wire {
    use super::{Location, SearchResult};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct GeocodeResponse {
        #[serde(default)]
        pub results: Vec<GeocodeResult>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodeResult {
        #[serde(default)]
        pub formatted: String,
        pub geometry: Geometry,
        #[serde(default)]
        pub components: Components,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        pub lat: f64,
        pub lng: f64,
    }

    #[derive(Debug, Default, Deserialize)]
    pub struct Components {
        pub road: Option<String>,
        pub city: Option<String>,
        pub town: Option<String>,
        pub village: Option<String>,
        pub state: Option<String>,
        pub country: Option<String>,
    }

    impl From<GeocodeResult> for SearchResult {
        fn from(result: GeocodeResult) -> Self {
            let components = result.components;
            let city = components.city.or(components.town).or(components.village);

            let name = if result.formatted.trim().is_empty() {
                [city.as_deref(), components.state.as_deref(), components.country.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(", ")
            } else {
                result.formatted
            };

            SearchResult {
                location: Location::new(name, result.geometry.lat, result.geometry.lng),
                street: components.road,
                city,
                region: components.state,
                country: components.country,
            }
        }
    }
}
