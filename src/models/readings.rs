//! Per-metric environmental readings as served by the backend
//!
//! Every reading is a flat record of optional fields plus a `source` and an
//! optional `error`. The backend fills `error` when its upstream provider
//! failed; the numeric fields of such a reading are not to be trusted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in time as the backend sends it: epoch seconds or an ISO string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(i64),
    Fractional(f64),
    Text(String),
}

impl Timestamp {
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Epoch(secs) => DateTime::from_timestamp(*secs, 0),
            #[allow(clippy::cast_possible_truncation)]
            Timestamp::Fractional(secs) => DateTime::from_timestamp(secs.trunc() as i64, 0),
            Timestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|_| {
                    chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M")
                        .map(|dt| dt.and_utc())
                })
                .ok(),
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            None => match self {
                Timestamp::Text(text) => write!(f, "{text}"),
                Timestamp::Epoch(secs) => write!(f, "{secs}"),
                Timestamp::Fractional(secs) => write!(f, "{secs}"),
            },
        }
    }
}

/// One displayable field of a reading
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Flag(bool),
    Time(Timestamp),
    Missing,
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(FieldValue::Missing, FieldValue::Number)
    }
}

impl From<Option<&String>> for FieldValue {
    fn from(value: Option<&String>) -> Self {
        value.map_or(FieldValue::Missing, |s| FieldValue::Text(s.clone()))
    }
}

impl From<Option<bool>> for FieldValue {
    fn from(value: Option<bool>) -> Self {
        value.map_or(FieldValue::Missing, FieldValue::Flag)
    }
}

impl From<Option<&Timestamp>> for FieldValue {
    fn from(value: Option<&Timestamp>) -> Self {
        value.map_or(FieldValue::Missing, |t| FieldValue::Time(t.clone()))
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n:.2}"),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Flag(b) => write!(f, "{}", if *b { "Yes" } else { "No" }),
            FieldValue::Time(t) => write!(f, "{t}"),
            FieldValue::Missing => write!(f, "—"),
        }
    }
}

/// Common view over every reading type
pub trait Reading {
    /// Upstream provider error reported by the backend
    fn error(&self) -> Option<&str>;

    /// Provider the backend took this reading from
    fn source(&self) -> Option<&str>;

    /// Named fields in display order, excluding `source` and `error`
    fn fields(&self) -> Vec<(&'static str, FieldValue)>;
}

macro_rules! reading_common {
    () => {
        fn error(&self) -> Option<&str> {
            self.error.as_deref().filter(|e| !e.is_empty())
        }

        fn source(&self) -> Option<&str> {
            self.source.as_deref()
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub source: Option<String>,
    /// Ordinal 1 (good) to 5 (very poor)
    pub aqi: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub o3: Option<f64>,
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub nh3: Option<f64>,
    pub timestamp: Option<Timestamp>,
    pub error: Option<String>,
}

impl Reading for AirQuality {
    reading_common!();

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("aqi", self.aqi.into()),
            ("pm2_5", self.pm2_5.into()),
            ("pm10", self.pm10.into()),
            ("o3", self.o3.into()),
            ("co", self.co.into()),
            ("no2", self.no2.into()),
            ("so2", self.so2.into()),
            ("nh3", self.nh3.into()),
            ("timestamp", self.timestamp.as_ref().into()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UvIndex {
    pub source: Option<String>,
    pub uv_index: Option<f64>,
    pub max_uv: Option<f64>,
    pub max_uv_time: Option<Timestamp>,
    pub timestamp: Option<Timestamp>,
    pub error: Option<String>,
}

impl Reading for UvIndex {
    reading_common!();

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("uv_index", self.uv_index.into()),
            ("max_uv", self.max_uv.into()),
            ("max_uv_time", self.max_uv_time.as_ref().into()),
            ("timestamp", self.timestamp.as_ref().into()),
        ]
    }
}

/// Pollen counts in grains/m³
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pollen {
    pub source: Option<String>,
    pub alder: Option<f64>,
    pub birch: Option<f64>,
    pub grass: Option<f64>,
    pub mugwort: Option<f64>,
    pub olive: Option<f64>,
    pub ragweed: Option<f64>,
    pub timestamp: Option<Timestamp>,
    pub error: Option<String>,
}

impl Reading for Pollen {
    reading_common!();

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("alder", self.alder.into()),
            ("birch", self.birch.into()),
            ("grass", self.grass.into()),
            ("mugwort", self.mugwort.into()),
            ("olive", self.olive.into()),
            ("ragweed", self.ragweed.into()),
            ("timestamp", self.timestamp.as_ref().into()),
        ]
    }
}

/// Relative humidity in percent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Humidity {
    pub source: Option<String>,
    pub humidity: Option<f64>,
    pub timestamp: Option<Timestamp>,
    pub error: Option<String>,
}

impl Reading for Humidity {
    reading_common!();

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("humidity", self.humidity.into()),
            ("timestamp", self.timestamp.as_ref().into()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TapWater {
    pub source: Option<String>,
    /// `None` when the backend could not decide
    #[serde(alias = "safe")]
    pub is_safe: Option<bool>,
    pub country: Option<String>,
    pub error: Option<String>,
}

impl Reading for TapWater {
    reading_common!();

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("is_safe", self.is_safe.into()),
            ("country", self.country.as_ref().into()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub current: Option<f64>,
    pub feels_like: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// m/s
    pub speed: Option<f64>,
    /// Degrees, 0 is North
    pub direction: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub description: Option<String>,
    pub icon: Option<String>,
    pub main: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub source: Option<String>,
    #[serde(default)]
    pub temperature: Temperature,
    pub humidity: Option<f64>,
    /// hPa
    pub pressure: Option<f64>,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub weather: Conditions,
    pub clouds: Option<f64>,
    pub visibility: Option<f64>,
    pub sunrise: Option<Timestamp>,
    pub sunset: Option<Timestamp>,
    pub timestamp: Option<Timestamp>,
    pub error: Option<String>,
}

impl Weather {
    /// Convert wind direction from degrees to cardinal direction
    #[must_use]
    pub fn wind_direction_to_cardinal(degrees: f64) -> &'static str {
        const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
        if !degrees.is_finite() {
            return "Unknown";
        }
        // sectors are 45 degrees wide, lower bound inclusive
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (((degrees.rem_euclid(360.0) + 22.5) / 45.0).floor() as usize) % POINTS.len();
        POINTS[index]
    }
}

impl Reading for Weather {
    reading_common!();

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("description", self.weather.description.as_ref().into()),
            ("temperature", self.temperature.current.into()),
            ("feels_like", self.temperature.feels_like.into()),
            ("min", self.temperature.min.into()),
            ("max", self.temperature.max.into()),
            ("humidity", self.humidity.into()),
            ("pressure", self.pressure.into()),
            ("wind_speed", self.wind.speed.into()),
            (
                "wind_direction",
                self.wind.direction.map_or(FieldValue::Missing, |d| {
                    FieldValue::Text(Self::wind_direction_to_cardinal(d).to_string())
                }),
            ),
            ("clouds", self.clouds.into()),
            ("visibility", self.visibility.into()),
            ("sunrise", self.sunrise.as_ref().into()),
            ("sunset", self.sunset.as_ref().into()),
        ]
    }
}

/// All readings for one cell; any of them may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalData {
    pub air_quality: Option<AirQuality>,
    pub tap_water: Option<TapWater>,
    pub uv: Option<UvIndex>,
    pub weather: Option<Weather>,
    pub humidity: Option<Humidity>,
    pub pollen: Option<Pollen>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_timestamp_forms() {
        let epoch: Timestamp = serde_json::from_str("1717000000").unwrap();
        assert_eq!(epoch, Timestamp::Epoch(1_717_000_000));
        assert!(epoch.to_datetime().is_some());

        let iso: Timestamp = serde_json::from_str(r#""2024-05-29T16:26:40Z""#).unwrap();
        assert_eq!(iso.to_datetime(), epoch.to_datetime());

        let hourly: Timestamp = serde_json::from_str(r#""2024-05-29T16:00""#).unwrap();
        assert!(hourly.to_datetime().is_some());

        let junk = Timestamp::Text("yesterday-ish".to_string());
        assert!(junk.to_datetime().is_none());
        assert_eq!(junk.to_string(), "yesterday-ish");
    }

    #[test]
    fn test_null_adapter_yields_missing_reading() {
        let data: EnvironmentalData = serde_json::from_str(
            r#"{"air_quality": null, "uv": {"source": "openweathermap", "uv_index": null, "timestamp": 1717000000}}"#,
        )
        .unwrap();

        assert!(data.air_quality.is_none());
        assert!(data.pollen.is_none());
        let uv = data.uv.unwrap();
        assert!(uv.uv_index.is_none());
        assert_eq!(uv.source(), Some("openweathermap"));
    }

    #[test]
    fn test_tap_water_accepts_both_field_names() {
        let web: TapWater = serde_json::from_str(r#"{"is_safe": false, "country": "Chile"}"#).unwrap();
        let mobile: TapWater = serde_json::from_str(r#"{"safe": true}"#).unwrap();
        assert_eq!(web.is_safe, Some(false));
        assert_eq!(mobile.is_safe, Some(true));
    }

    #[test]
    fn test_empty_error_is_not_an_error() {
        let humidity = Humidity {
            humidity: Some(45.0),
            error: Some(String::new()),
            ..Default::default()
        };
        assert!(humidity.error().is_none());
    }

    #[test]
    fn test_field_formatting() {
        assert_eq!(FieldValue::Number(3.14159).to_string(), "3.14");
        assert_eq!(FieldValue::Missing.to_string(), "—");
        assert_eq!(FieldValue::Flag(true).to_string(), "Yes");
    }

    #[test]
    fn test_wind_direction_to_cardinal() {
        assert_eq!(Weather::wind_direction_to_cardinal(0.0), "N");
        assert_eq!(Weather::wind_direction_to_cardinal(45.0), "NE");
        assert_eq!(Weather::wind_direction_to_cardinal(90.0), "E");
        assert_eq!(Weather::wind_direction_to_cardinal(180.0), "S");
        assert_eq!(Weather::wind_direction_to_cardinal(270.0), "W");
        assert_eq!(Weather::wind_direction_to_cardinal(355.0), "N");
    }

    #[rstest]
    #[case(22.4, "N")]
    #[case(22.5, "NE")]
    #[case(112.5, "SE")]
    #[case(200.0, "S")]
    #[case(250.0, "W")]
    #[case(337.4, "NW")]
    #[case(337.5, "N")]
    #[case(-45.0, "NW")]
    #[case(720.0, "N")]
    fn test_wind_direction_uses_eight_sectors(#[case] degrees: f64, #[case] expected: &str) {
        assert_eq!(Weather::wind_direction_to_cardinal(degrees), expected);
    }
}
