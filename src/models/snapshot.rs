//! The full `/cells` payload for one location

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EnvironmentalData, NewsFeed};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalSnapshot {
    /// Backend cell the readings were aggregated for
    pub h3_cell: Option<String>,
    /// Backend-supplied place name
    pub location: Option<String>,
    #[serde(default)]
    pub data: EnvironmentalData,
    #[serde(default)]
    pub news: NewsFeed,
    /// Epoch seconds of the backend's last aggregation
    pub last_updated: Option<i64>,
}

impl EnvironmentalSnapshot {
    #[must_use]
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Backend place name, ignoring blanks
    #[must_use]
    pub fn location_name(&self) -> Option<&str> {
        self.location.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
