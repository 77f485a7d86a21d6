//! Coarse low/moderate/high classification per metric

use super::{Metric, MetricStatus, RiskPolicy, RiskTier, TapWaterPolicy};
use crate::models::{EnvironmentalData, Reading};

/// `aqi >= 4` is high, exactly 3 is moderate, anything else low
#[must_use]
pub fn classify_aqi(aqi: f64) -> RiskTier {
    if aqi >= 4.0 {
        RiskTier::High
    } else if (aqi - 3.0).abs() < f64::EPSILON {
        RiskTier::Moderate
    } else {
        RiskTier::Low
    }
}

/// Above 6 is high, above 3 moderate
#[must_use]
pub fn classify_uv(uv_index: f64) -> RiskTier {
    if uv_index > 6.0 {
        RiskTier::High
    } else if uv_index > 3.0 {
        RiskTier::Moderate
    } else {
        RiskTier::Low
    }
}

/// Coarse pollen risk from the birch count alone
#[must_use]
pub fn classify_birch(birch: f64) -> RiskTier {
    if birch > 100.0 {
        RiskTier::High
    } else if birch > 20.0 {
        RiskTier::Moderate
    } else {
        RiskTier::Low
    }
}

#[must_use]
pub fn classify_humidity(humidity: f64) -> RiskTier {
    if humidity > 60.0 {
        RiskTier::High
    } else if humidity < 30.0 {
        RiskTier::Low
    } else {
        RiskTier::Moderate
    }
}

#[must_use]
pub fn classify_tap_water(is_safe: bool, policy: TapWaterPolicy) -> RiskTier {
    match (is_safe, policy) {
        (true, _) => RiskTier::Low,
        (false, TapWaterPolicy::High) => RiskTier::High,
        (false, TapWaterPolicy::Moderate) => RiskTier::Moderate,
    }
}

/// Status for one optional reading: backend errors first, then missing values
fn assess_reading<R, T>(
    reading: Option<&R>,
    policy: &RiskPolicy,
    value: impl FnOnce(&R) -> Option<T>,
    classify: impl FnOnce(T) -> RiskTier,
) -> MetricStatus
where
    R: Reading,
{
    let Some(reading) = reading else {
        return policy.missing();
    };

    if let Some(error) = reading.error() {
        return MetricStatus::Error(error.to_string());
    }

    value(reading).map_or_else(|| policy.missing(), |v| MetricStatus::Rated(classify(v)))
}

/// Classify one metric of a snapshot
#[must_use]
pub fn assess(metric: Metric, data: &EnvironmentalData, policy: &RiskPolicy) -> MetricStatus {
    match metric {
        Metric::AirQuality => {
            assess_reading(data.air_quality.as_ref(), policy, |r| r.aqi, classify_aqi)
        }
        Metric::Uv => assess_reading(data.uv.as_ref(), policy, |r| r.uv_index, classify_uv),
        Metric::Pollen => assess_reading(
            data.pollen.as_ref(),
            policy,
            |r| Some(r.birch.unwrap_or(0.0)),
            classify_birch,
        ),
        Metric::Humidity => assess_reading(
            data.humidity.as_ref(),
            policy,
            |r| r.humidity,
            classify_humidity,
        ),
        Metric::TapWater => assess_reading(
            data.tap_water.as_ref(),
            policy,
            |r| r.is_safe,
            |safe| classify_tap_water(safe, policy.tap_water_unsafe),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AirQuality, Humidity, Pollen, TapWater, UvIndex};
    use crate::risk::MissingReadingPolicy;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, RiskTier::Low)]
    #[case(1.0, RiskTier::Low)]
    #[case(2.0, RiskTier::Low)]
    #[case(3.0, RiskTier::Moderate)]
    #[case(3.5, RiskTier::Low)]
    #[case(4.0, RiskTier::High)]
    #[case(5.0, RiskTier::High)]
    #[case(9.0, RiskTier::High)]
    fn test_aqi_thresholds(#[case] aqi: f64, #[case] expected: RiskTier) {
        assert_eq!(classify_aqi(aqi), expected);
    }

    #[rstest]
    #[case(0.0, RiskTier::Low)]
    #[case(3.0, RiskTier::Low)]
    #[case(3.1, RiskTier::Moderate)]
    #[case(6.0, RiskTier::Moderate)]
    #[case(6.01, RiskTier::High)]
    #[case(11.0, RiskTier::High)]
    fn test_uv_thresholds(#[case] uv: f64, #[case] expected: RiskTier) {
        assert_eq!(classify_uv(uv), expected);
    }

    #[rstest]
    #[case(0.0, RiskTier::Low)]
    #[case(20.0, RiskTier::Low)]
    #[case(21.0, RiskTier::Moderate)]
    #[case(100.0, RiskTier::Moderate)]
    #[case(100.5, RiskTier::High)]
    fn test_birch_thresholds(#[case] birch: f64, #[case] expected: RiskTier) {
        assert_eq!(classify_birch(birch), expected);
    }

    #[rstest]
    #[case(10.0, RiskTier::Low)]
    #[case(29.9, RiskTier::Low)]
    #[case(30.0, RiskTier::Moderate)]
    #[case(60.0, RiskTier::Moderate)]
    #[case(61.0, RiskTier::High)]
    fn test_humidity_thresholds(#[case] humidity: f64, #[case] expected: RiskTier) {
        assert_eq!(classify_humidity(humidity), expected);
    }

    #[test]
    fn test_tap_water_policy() {
        assert_eq!(classify_tap_water(true, TapWaterPolicy::High), RiskTier::Low);
        assert_eq!(classify_tap_water(false, TapWaterPolicy::High), RiskTier::High);
        assert_eq!(
            classify_tap_water(false, TapWaterPolicy::Moderate),
            RiskTier::Moderate
        );
    }

    #[test]
    fn test_error_reading_is_never_low() {
        let data = EnvironmentalData {
            air_quality: Some(AirQuality {
                aqi: Some(1.0),
                error: Some("unavailable".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let status = assess(Metric::AirQuality, &data, &RiskPolicy::default());
        assert_eq!(status, MetricStatus::Error("unavailable".to_string()));
    }

    #[test]
    fn test_missing_readings_follow_policy() {
        let data = EnvironmentalData {
            uv: Some(UvIndex::default()),
            ..Default::default()
        };
        let lenient = RiskPolicy::default();
        let strict = RiskPolicy {
            missing_reading: MissingReadingPolicy::Unknown,
            ..Default::default()
        };

        assert_eq!(
            assess(Metric::AirQuality, &data, &lenient),
            MetricStatus::Rated(RiskTier::Low)
        );
        assert_eq!(assess(Metric::AirQuality, &data, &strict), MetricStatus::Unknown);
        // reading present, value null
        assert_eq!(assess(Metric::Uv, &data, &strict), MetricStatus::Unknown);
    }

    #[test]
    fn test_pollen_without_birch_is_low() {
        let data = EnvironmentalData {
            pollen: Some(Pollen {
                grass: Some(500.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let strict = RiskPolicy {
            missing_reading: MissingReadingPolicy::Unknown,
            ..Default::default()
        };
        assert_eq!(
            assess(Metric::Pollen, &data, &strict),
            MetricStatus::Rated(RiskTier::Low)
        );
    }

    #[test]
    fn test_assess_each_metric() {
        let data = EnvironmentalData {
            air_quality: Some(AirQuality {
                aqi: Some(3.0),
                ..Default::default()
            }),
            uv: Some(UvIndex {
                uv_index: Some(7.2),
                ..Default::default()
            }),
            humidity: Some(Humidity {
                humidity: Some(45.0),
                ..Default::default()
            }),
            tap_water: Some(TapWater {
                is_safe: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        let policy = RiskPolicy {
            tap_water_unsafe: TapWaterPolicy::Moderate,
            ..Default::default()
        };

        assert_eq!(
            assess(Metric::AirQuality, &data, &policy),
            MetricStatus::Rated(RiskTier::Moderate)
        );
        assert_eq!(
            assess(Metric::Uv, &data, &policy),
            MetricStatus::Rated(RiskTier::High)
        );
        assert_eq!(
            assess(Metric::Humidity, &data, &policy),
            MetricStatus::Rated(RiskTier::Moderate)
        );
        assert_eq!(
            assess(Metric::TapWater, &data, &policy),
            MetricStatus::Rated(RiskTier::Moderate)
        );
    }
}
