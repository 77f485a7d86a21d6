//! Colour bands for the detail views
//!
//! These are finer than the dashboard tiers and only drive presentation.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::models::{Reading, Weather};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum AqiBand {
    Good,
    Fair,
    Moderate,
    Poor,
    #[strum(to_string = "Very Poor")]
    VeryPoor,
}

impl AqiBand {
    #[must_use]
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi <= 1.0 {
            AqiBand::Good
        } else if aqi <= 2.0 {
            AqiBand::Fair
        } else if aqi <= 3.0 {
            AqiBand::Moderate
        } else if aqi <= 4.0 {
            AqiBand::Poor
        } else {
            AqiBand::VeryPoor
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            AqiBand::Good => "green",
            AqiBand::Fair => "yellow",
            AqiBand::Moderate => "orange",
            AqiBand::Poor => "red",
            AqiBand::VeryPoor => "purple",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum UvBand {
    Low,
    Moderate,
    High,
    #[strum(to_string = "Very High")]
    VeryHigh,
    Extreme,
}

impl UvBand {
    #[must_use]
    pub fn from_index(uv_index: f64) -> Self {
        if uv_index <= 2.0 {
            UvBand::Low
        } else if uv_index <= 5.0 {
            UvBand::Moderate
        } else if uv_index <= 7.0 {
            UvBand::High
        } else if uv_index <= 10.0 {
            UvBand::VeryHigh
        } else {
            UvBand::Extreme
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            UvBand::Low => "green",
            UvBand::Moderate => "yellow",
            UvBand::High => "orange",
            UvBand::VeryHigh => "red",
            UvBand::Extreme => "purple",
        }
    }
}

/// Distance of a weather value from its comfortable range, ordered by severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ComfortBand {
    Comfortable,
    #[strum(to_string = "Outside Comfort")]
    OutsideComfort,
    Extreme,
}

impl ComfortBand {
    #[must_use]
    pub fn for_humidity(humidity: f64) -> Self {
        Self::banded(humidity, (30.0, 60.0), (20.0, 80.0))
    }

    /// Pressure in hPa
    #[must_use]
    pub fn for_pressure(pressure: f64) -> Self {
        Self::banded(pressure, (980.0, 1030.0), (950.0, 1060.0))
    }

    fn banded(value: f64, comfortable: (f64, f64), tolerable: (f64, f64)) -> Self {
        if (comfortable.0..=comfortable.1).contains(&value) {
            ComfortBand::Comfortable
        } else if (tolerable.0..=tolerable.1).contains(&value) {
            ComfortBand::OutsideComfort
        } else {
            ComfortBand::Extreme
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            ComfortBand::Comfortable => "green",
            ComfortBand::OutsideComfort => "yellow",
            ComfortBand::Extreme => "red",
        }
    }
}

/// Combined humidity and pressure verdict for a weather reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionsSummary {
    pub band: ComfortBand,
    pub status: &'static str,
}

impl ConditionsSummary {
    /// `None` when the reading failed or carries neither humidity nor pressure
    #[must_use]
    pub fn from_weather(weather: &Weather) -> Option<Self> {
        if weather.error().is_some() {
            return None;
        }
        Self::from_values(weather.humidity, weather.pressure)
    }

    #[must_use]
    pub fn from_values(humidity: Option<f64>, pressure: Option<f64>) -> Option<Self> {
        if humidity.is_none() && pressure.is_none() {
            return None;
        }

        let humidity_band = humidity.map(ComfortBand::for_humidity);
        let pressure_band = pressure.map(ComfortBand::for_pressure);
        let band = humidity_band
            .into_iter()
            .chain(pressure_band)
            .max()
            .unwrap_or(ComfortBand::Comfortable);

        let status = match (pressure, pressure_band, humidity, humidity_band) {
            (Some(p), Some(ComfortBand::Extreme), ..) => {
                if p < 980.0 { "Low Pressure" } else { "High Pressure" }
            }
            (Some(p), Some(ComfortBand::OutsideComfort), ..) => {
                if p < 1013.0 { "Low Pressure" } else { "High Pressure" }
            }
            (.., Some(h), Some(ComfortBand::Extreme)) => {
                if h < 30.0 { "Dry" } else { "Humid" }
            }
            (.., Some(h), Some(ComfortBand::OutsideComfort)) => {
                if h < 50.0 { "Dry" } else { "Humid" }
            }
            _ => "Normal",
        };

        Some(Self { band, status })
    }
}
