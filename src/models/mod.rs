//! Data models for the `HealthExposure` client
//!
//! This module contains the backend's domain records organized by concern:
//! - Location: named coordinates and geocoding search results
//! - Readings: per-metric environmental readings for one cell
//! - News: local health news articles
//! - Snapshot: the full `/cells` payload tying the above together

pub mod location;
pub mod news;
pub mod readings;
pub mod snapshot;

// Re-export all public types for convenient access
pub use location::{Location, SearchResult};
pub use news::{NewsArticle, NewsFeed};
pub use readings::{
    AirQuality, EnvironmentalData, FieldValue, Humidity, Pollen, Reading, TapWater, Timestamp,
    UvIndex, Weather,
};
pub use snapshot::EnvironmentalSnapshot;
