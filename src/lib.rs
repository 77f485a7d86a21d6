//! `HealthExposure` - environmental health risk dashboard client
//!
//! This library fetches per-location air quality, UV, pollen, humidity,
//! tap-water and weather readings from the health backend, classifies them
//! into risk tiers, and builds the dashboard and detail views from them.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod dashboard;
pub mod error;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod news;
pub mod risk;

// Re-export core types for public API
pub use api::{EnvironmentSource, HealthApiClient};
pub use config::AppConfig;
pub use coordinator::{FetchOutcome, RefreshCoordinator};
pub use dashboard::{DashboardView, MetricDetail, MetricRow};
pub use error::HealthExposureError;
pub use location_resolver::{LocationInput, LocationResolver, PositionProvider};
pub use models::{EnvironmentalData, EnvironmentalSnapshot, Location, SearchResult};
pub use news::{NewsCard, NewsCarousel};
pub use risk::{Metric, MetricStatus, RiskPolicy, RiskTier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, HealthExposureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert!(api::USER_AGENT.ends_with(VERSION));
    }
}
