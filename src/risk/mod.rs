//! Risk classification
//!
//! Maps raw backend readings onto risk tiers:
//! - `classifier`: the coarse low/moderate/high rules used for the dashboard list
//! - `pollen`: the five-level per-allergen pollen scale
//! - `scale`: the finer colour bands for AQI, UV and weather conditions
//!
//! Classification is pure; nothing in here performs I/O.

pub mod classifier;
pub mod pollen;
pub mod scale;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

pub use classifier::{
    assess, classify_aqi, classify_birch, classify_humidity, classify_tap_water, classify_uv,
};
pub use pollen::{Allergen, PollenLevel, allergen_levels, overall_level, pollen_color};
pub use scale::{AqiBand, ComfortBand, ConditionsSummary, UvBand};

/// Coarse risk tier, ordered `Low < Moderate < High`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    /// Display priority; lower ranks are shown first
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            RiskTier::High => 0,
            RiskTier::Moderate => 1,
            RiskTier::Low => 2,
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            RiskTier::High => "red",
            RiskTier::Moderate => "yellow",
            RiskTier::Low => "green",
        }
    }
}

/// What the dashboard shows for one metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum MetricStatus {
    Rated(RiskTier),
    /// The backend flagged the reading as failed
    Error(String),
    /// No reading and the missing-value policy declines to guess
    Unknown,
}

impl MetricStatus {
    /// Display priority: tiers by severity, then errors, then unknowns
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            MetricStatus::Rated(tier) => tier.rank(),
            MetricStatus::Error(_) => 3,
            MetricStatus::Unknown => 4,
        }
    }

    #[must_use]
    pub fn tier(&self) -> Option<RiskTier> {
        match self {
            MetricStatus::Rated(tier) => Some(*tier),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, MetricStatus::Error(_))
    }

    /// Short badge text
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            MetricStatus::Rated(tier) => tier.to_string().to_uppercase(),
            MetricStatus::Error(message) => format!("ERROR: {message}"),
            MetricStatus::Unknown => "UNKNOWN".to_string(),
        }
    }
}

/// The metrics shown as rows on the dashboard
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Metric {
    AirQuality,
    #[strum(to_string = "uv", serialize = "uv_index")]
    Uv,
    Pollen,
    Humidity,
    TapWater,
}

impl Metric {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Metric::AirQuality => "Air Quality",
            Metric::Uv => "UV Index",
            Metric::Pollen => "Pollen",
            Metric::Humidity => "Humidity",
            Metric::TapWater => "Tap Water",
        }
    }

    /// Short health guidance shown on the detail view
    #[must_use]
    pub fn explanation(self) -> &'static str {
        match self {
            Metric::AirQuality => {
                "AQI runs from 1 (good) to 5 (very poor). At 3 sensitive groups may feel effects; \
                 from 4 everyone may begin to experience health effects."
            }
            Metric::Uv => {
                "UV 0-2 is low, 3-5 moderate, 6-7 high, 8-10 very high and 11+ extreme. \
                 Above 3 use sun protection; above 6 protection is required."
            }
            Metric::Pollen => {
                "Counts in grains/m³ per allergen. Birch is the most significant; the overall \
                 level is the highest level reached by any allergen."
            }
            Metric::Humidity => {
                "30-60% is comfortable. Below 30% dries skin and airways; above 60% favours \
                 mould and dust mites."
            }
            Metric::TapWater => {
                "Based on national drinking water standards for the country of the location. \
                 Where tap water is not considered safe, drink bottled or treated water."
            }
        }
    }
}

/// How an unsafe tap-water verdict is ranked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapWaterPolicy {
    #[default]
    High,
    Moderate,
}

/// How a metric with no reading is presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReadingPolicy {
    /// Show the metric as low risk
    #[default]
    AssumeLow,
    /// Show the metric as unknown
    Unknown,
}

/// Policies for classifications the backend data leaves open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    pub tap_water_unsafe: TapWaterPolicy,
    pub missing_reading: MissingReadingPolicy,
}

impl RiskPolicy {
    #[must_use]
    pub fn missing(&self) -> MetricStatus {
        match self.missing_reading {
            MissingReadingPolicy::AssumeLow => MetricStatus::Rated(RiskTier::Low),
            MissingReadingPolicy::Unknown => MetricStatus::Unknown,
        }
    }
}

/// Stable sort putting the highest risk first.
///
/// Items with equal rank keep their input order.
pub fn sort_by_risk<T, F>(items: &mut [T], status: F)
where
    F: Fn(&T) -> &MetricStatus,
{
    items.sort_by_key(|item| status(item).rank());
}
