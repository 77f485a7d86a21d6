//! Presentation model for the risk dashboard and metric detail views

use std::fmt;

use chrono::{DateTime, Utc};
use strum::IntoEnumIterator;

use crate::models::{EnvironmentalData, EnvironmentalSnapshot, Location, Reading, Weather};
use crate::news::{DEFAULT_RECENT_DAYS, NewsCard};
use crate::risk::{
    self, AqiBand, ComfortBand, ConditionsSummary, Metric, MetricStatus, RiskPolicy, RiskTier,
    UvBand, allergen_levels, overall_level,
};

/// One metric line of the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub metric: Metric,
    pub status: MetricStatus,
    pub summary: String,
    pub source: Option<String>,
}

impl MetricRow {
    fn build(metric: Metric, data: &EnvironmentalData, policy: &RiskPolicy) -> Self {
        let status = risk::assess(metric, data, policy);
        let reading = reading_for(metric, data);
        let summary = match &status {
            MetricStatus::Error(_) => "—".to_string(),
            _ => summarize(metric, data).unwrap_or_else(|| "No data".to_string()),
        };

        Self {
            metric,
            status,
            summary,
            source: reading.and_then(|r| r.source().map(str::to_string)),
        }
    }

    #[must_use]
    pub fn badge(&self) -> &'static str {
        match &self.status {
            MetricStatus::Rated(RiskTier::High) => "🔴",
            MetricStatus::Rated(RiskTier::Moderate) => "🟡",
            MetricStatus::Rated(RiskTier::Low) => "🟢",
            MetricStatus::Error(_) => "⚠️",
            MetricStatus::Unknown => "⚪",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub location: Option<String>,
    pub h3_cell: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Sorted highest risk first
    pub rows: Vec<MetricRow>,
    pub weather: Option<String>,
    pub conditions: Option<ConditionsSummary>,
    pub news: NewsCard,
}

impl DashboardView {
    #[must_use]
    pub fn build(snapshot: &EnvironmentalSnapshot, policy: &RiskPolicy) -> Self {
        Self::build_at(
            snapshot,
            policy,
            Utc::now(),
            chrono::Duration::days(DEFAULT_RECENT_DAYS),
        )
    }

    /// Build with an explicit clock and news window
    #[must_use]
    pub fn build_at(
        snapshot: &EnvironmentalSnapshot,
        policy: &RiskPolicy,
        now: DateTime<Utc>,
        news_window: chrono::Duration,
    ) -> Self {
        let data = &snapshot.data;
        let mut rows: Vec<MetricRow> = Metric::iter()
            .map(|metric| MetricRow::build(metric, data, policy))
            .collect();
        risk::sort_by_risk(&mut rows, |row| &row.status);

        let weather = data.weather.as_ref().filter(|w| w.error().is_none());

        Self {
            location: snapshot.location_name().map(str::to_string),
            h3_cell: snapshot.h3_cell.clone(),
            last_updated: snapshot.last_updated_at(),
            rows,
            weather: weather.and_then(summarize_weather),
            conditions: weather.and_then(ConditionsSummary::from_weather),
            news: NewsCard::from_feed(&snapshot.news, now, news_window),
        }
    }

    /// Use the resolved location when the backend sent no place name
    #[must_use]
    pub fn with_fallback_location(mut self, location: &Location) -> Self {
        if self.location.is_none() {
            self.location = Some(location.display_label());
        }
        self
    }

    #[must_use]
    pub fn row(&self, metric: Metric) -> Option<&MetricRow> {
        self.rows.iter().find(|row| row.metric == metric)
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "📍 {}",
            self.location.as_deref().unwrap_or("Unknown location")
        )?;
        match self.last_updated {
            Some(at) => writeln!(f, "   Last updated {}", at.format("%Y-%m-%d %H:%M UTC"))?,
            None => writeln!(f, "   Last updated: unknown")?,
        }
        writeln!(f)?;

        for row in &self.rows {
            let badge_text = row.status.label();
            writeln!(
                f,
                "{} {:<12} {:<10} {}",
                row.badge(),
                row.metric.label(),
                badge_text,
                row.summary
            )?;
        }

        if let Some(weather) = &self.weather {
            writeln!(f)?;
            writeln!(f, "🌤  {weather}")?;
        }
        if let Some(conditions) = &self.conditions {
            writeln!(
                f,
                "   Conditions: {} ({})",
                conditions.status, conditions.band
            )?;
        }

        writeln!(f)?;
        match self.news.message() {
            Some(message) => writeln!(f, "📰 {message}")?,
            None => {
                let articles = self.news.articles();
                writeln!(f, "📰 {} recent health article(s)", articles.len())?;
                for article in articles.iter().take(3) {
                    writeln!(f, "   • {}", article.title)?;
                }
            }
        }
        Ok(())
    }
}

/// Every field of one metric's reading, for the detail view
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDetail {
    pub metric: Metric,
    pub status: MetricStatus,
    pub source: Option<String>,
    /// Title-cased field names with formatted values
    pub fields: Vec<(String, String)>,
    /// Finer colour band, where the metric has one
    pub band: Option<(String, &'static str)>,
    pub explanation: &'static str,
}

impl MetricDetail {
    #[must_use]
    pub fn build(metric: Metric, data: &EnvironmentalData, policy: &RiskPolicy) -> Self {
        let reading = reading_for(metric, data);
        let fields = reading
            .map(|r| {
                r.fields()
                    .into_iter()
                    .map(|(key, value)| (title_case(key), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            metric,
            status: risk::assess(metric, data, policy),
            source: reading.and_then(|r| r.source().map(str::to_string)),
            fields,
            band: band_for(metric, data),
            explanation: metric.explanation(),
        }
    }
}

impl fmt::Display for MetricDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} — {}", self.metric.label(), self.status.label())?;
        if let Some((band, color)) = &self.band {
            writeln!(f, "Level: {band} ({color})")?;
        }
        if let Some(source) = &self.source {
            writeln!(f, "Source: {source}")?;
        }
        writeln!(f)?;

        if self.fields.is_empty() {
            writeln!(f, "No data available")?;
        }
        let width = self.fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in &self.fields {
            writeln!(f, "  {key:<width$}  {value}")?;
        }

        writeln!(f)?;
        writeln!(f, "{}", self.explanation)
    }
}

fn reading_for(metric: Metric, data: &EnvironmentalData) -> Option<&dyn Reading> {
    match metric {
        Metric::AirQuality => data.air_quality.as_ref().map(|r| r as &dyn Reading),
        Metric::Uv => data.uv.as_ref().map(|r| r as &dyn Reading),
        Metric::Pollen => data.pollen.as_ref().map(|r| r as &dyn Reading),
        Metric::Humidity => data.humidity.as_ref().map(|r| r as &dyn Reading),
        Metric::TapWater => data.tap_water.as_ref().map(|r| r as &dyn Reading),
    }
}

fn summarize(metric: Metric, data: &EnvironmentalData) -> Option<String> {
    match metric {
        Metric::AirQuality => {
            let reading = data.air_quality.as_ref()?;
            let aqi = reading.aqi?;
            let mut summary = format!("AQI {aqi:.0} ({})", AqiBand::from_aqi(aqi));
            if let Some(pm2_5) = reading.pm2_5 {
                summary.push_str(&format!(", PM2.5 {pm2_5:.1} µg/m³"));
            }
            Some(summary)
        }
        Metric::Uv => {
            let reading = data.uv.as_ref()?;
            let uv = reading.uv_index?;
            let mut summary = format!("UV {uv:.1} ({})", UvBand::from_index(uv));
            if let Some(max_uv) = reading.max_uv {
                summary.push_str(&format!(", max {max_uv:.1}"));
            }
            Some(summary)
        }
        Metric::Pollen => {
            let pollen = data.pollen.as_ref()?;
            let level = overall_level(pollen)?;
            Some(match pollen.birch {
                Some(birch) => format!("Birch {birch:.0} grains/m³, overall {}", level.label()),
                None => format!("Overall {}", level.label()),
            })
        }
        Metric::Humidity => {
            let humidity = data.humidity.as_ref()?.humidity?;
            Some(format!(
                "{humidity:.0}% ({})",
                ComfortBand::for_humidity(humidity)
            ))
        }
        Metric::TapWater => {
            let reading = data.tap_water.as_ref()?;
            let verdict = match reading.is_safe? {
                true => "Safe to drink",
                false => "Not safe to drink",
            };
            Some(match &reading.country {
                Some(country) => format!("{verdict} ({country})"),
                None => verdict.to_string(),
            })
        }
    }
}

fn summarize_weather(weather: &Weather) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(description) = &weather.weather.description {
        parts.push(capitalize(description));
    }
    if let Some(current) = weather.temperature.current {
        match weather.temperature.feels_like {
            Some(feels) => parts.push(format!("{current:.1}°C (feels like {feels:.1}°C)")),
            None => parts.push(format!("{current:.1}°C")),
        }
    }
    if let Some(speed) = weather.wind.speed {
        let direction = weather
            .wind
            .direction
            .map(Weather::wind_direction_to_cardinal)
            .unwrap_or_default();
        parts.push(format!("wind {speed:.1} m/s {direction}").trim_end().to_string());
    }

    (!parts.is_empty()).then(|| parts.join(", "))
}

fn band_for(metric: Metric, data: &EnvironmentalData) -> Option<(String, &'static str)> {
    match metric {
        Metric::AirQuality => {
            let reading = data.air_quality.as_ref().filter(|r| r.error().is_none())?;
            let band = AqiBand::from_aqi(reading.aqi?);
            Some((band.to_string(), band.color()))
        }
        Metric::Uv => {
            let reading = data.uv.as_ref().filter(|r| r.error().is_none())?;
            let band = UvBand::from_index(reading.uv_index?);
            Some((band.to_string(), band.color()))
        }
        Metric::Pollen => {
            let pollen = data.pollen.as_ref()?;
            let level = overall_level(pollen)?;
            let worst: Vec<String> = allergen_levels(pollen)
                .into_iter()
                .filter(|(_, l)| *l == level)
                .map(|(allergen, _)| allergen.to_string())
                .collect();
            Some((
                format!("{} ({})", level.label(), worst.join(", ")),
                level.color(),
            ))
        }
        Metric::Humidity => {
            let reading = data.humidity.as_ref().filter(|r| r.error().is_none())?;
            let band = ComfortBand::for_humidity(reading.humidity?);
            Some((band.to_string(), band.color()))
        }
        Metric::TapWater => None,
    }
}

/// `max_uv_time` -> `Max Uv Time`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
