//! Five-level pollen scale
//!
//! Thresholds are per allergen in grains/m³ and are upper-inclusive: a count
//! equal to a bound still belongs to the lower level. The overall level of a
//! reading is the highest level any allergen reaches.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::models::{Pollen, Reading};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PollenLevel {
    Low,
    LowMedium,
    Medium,
    MediumHigh,
    High,
}

impl PollenLevel {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PollenLevel::Low => "Low",
            PollenLevel::LowMedium => "Low-Medium",
            PollenLevel::Medium => "Medium",
            PollenLevel::MediumHigh => "Medium-High",
            PollenLevel::High => "High",
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            PollenLevel::Low => "green",
            PollenLevel::LowMedium => "blue",
            PollenLevel::Medium => "yellow",
            PollenLevel::MediumHigh => "orange",
            PollenLevel::High => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Allergen {
    Alder,
    Birch,
    Grass,
    Mugwort,
    Olive,
    Ragweed,
}

impl Allergen {
    /// Upper bounds of low, low-medium, medium and medium-high
    #[must_use]
    pub fn thresholds(self) -> [f64; 4] {
        match self {
            Allergen::Alder => [39.0, 58.0, 77.0, 115.0],
            Allergen::Birch => [650.0, 975.0, 1300.0, 1950.0],
            Allergen::Grass => [26.0, 40.0, 53.0, 79.0],
            Allergen::Mugwort => [24.0, 35.0, 47.0, 71.0],
            Allergen::Olive => [44.0, 65.0, 87.0, 131.0],
            Allergen::Ragweed => [14.0, 21.0, 29.0, 43.0],
        }
    }

    /// Level for a single count; missing or non-positive counts are low
    #[must_use]
    pub fn classify(self, count: Option<f64>) -> PollenLevel {
        let Some(count) = count.filter(|c| *c > 0.0) else {
            return PollenLevel::Low;
        };

        let [low, low_medium, medium, medium_high] = self.thresholds();
        if count <= low {
            PollenLevel::Low
        } else if count <= low_medium {
            PollenLevel::LowMedium
        } else if count <= medium {
            PollenLevel::Medium
        } else if count <= medium_high {
            PollenLevel::MediumHigh
        } else {
            PollenLevel::High
        }
    }

    #[must_use]
    pub fn count(self, pollen: &Pollen) -> Option<f64> {
        match self {
            Allergen::Alder => pollen.alder,
            Allergen::Birch => pollen.birch,
            Allergen::Grass => pollen.grass,
            Allergen::Mugwort => pollen.mugwort,
            Allergen::Olive => pollen.olive,
            Allergen::Ragweed => pollen.ragweed,
        }
    }
}

/// Level of every allergen in a reading, in table order
#[must_use]
pub fn allergen_levels(pollen: &Pollen) -> Vec<(Allergen, PollenLevel)> {
    Allergen::iter()
        .map(|allergen| (allergen, allergen.classify(allergen.count(pollen))))
        .collect()
}

/// Highest level across all allergens, `None` for a failed reading
#[must_use]
pub fn overall_level(pollen: &Pollen) -> Option<PollenLevel> {
    if pollen.error().is_some() {
        return None;
    }

    allergen_levels(pollen)
        .into_iter()
        .map(|(_, level)| level)
        .max()
}

/// Card colour for a pollen reading; grey when there is nothing to rate
#[must_use]
pub fn pollen_color(pollen: Option<&Pollen>) -> &'static str {
    pollen
        .and_then(overall_level)
        .map_or("gray", PollenLevel::color)
}
