//! Configuration management for the `HealthExposure` client
//!
//! Handles loading configuration from files and environment variables,
//! and validates every setting before the client is built from it.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::risk::RiskPolicy;
use crate::{HealthExposureError, Result};

const APP_DIR: &str = "health-exposure";
const ENV_PREFIX: &str = "HEALTH_EXPOSURE";

/// Commented starting point written by `health-exposure config --init`
pub const CONFIG_TEMPLATE: &str = r#"# health-exposure configuration
# Every key can also be set as HEALTH_EXPOSURE__<SECTION>__<KEY>.

[api]
# api_key = "your-api-key"
user_tier = "free"
timeout_seconds = 30
# transient failures only; 0 keeps refreshes manual
max_retries = 0

[refresh]
cooldown_seconds = 300
carousel_interval_seconds = 5
recent_news_days = 30

[risk]
# "high" or "moderate"
tap_water_unsafe = "high"
# "assume_low" or "unknown"
missing_reading = "assume_low"

[locate]
# latitude = 60.1699
# longitude = 24.9384
timeout_seconds = 10

[logging]
level = "info"
format = "pretty"
"#;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend API settings
    pub api: ApiConfig,
    /// Refresh and carousel timing
    pub refresh: RefreshConfig,
    /// Policies for ambiguous classifications
    pub risk: RiskPolicy,
    /// Device position settings
    pub locate: LocateConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Backend API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL serving `/cells` and `/geocode`
    pub base_url: String,
    /// Value of the `x-api-key` header
    pub api_key: Option<String>,
    /// Value of the `x-user-tier` header (free or premium)
    pub user_tier: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Transient-failure retries; 0 keeps failures terminal
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Minimum time between manual refreshes
    pub cooldown_seconds: u64,
    /// Time each news article stays on screen
    pub carousel_interval_seconds: u64,
    /// Articles older than this are left out of the carousel
    pub recent_news_days: u32,
}

/// Where the device position comes from.
///
/// With both `latitude` and `longitude` set the position is fixed; otherwise
/// it is looked up by IP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip_lookup_url: String,
    pub timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

fn default_base_url() -> String {
    "https://dokrd0asw0.execute-api.eu-north-1.amazonaws.com".to_string()
}

fn default_user_tier() -> String {
    "free".to_string()
}

fn default_api_timeout() -> u32 {
    30
}

fn default_cooldown() -> u64 {
    300
}

fn default_carousel_interval() -> u64 {
    5
}

fn default_recent_news_days() -> u32 {
    30
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_locate_timeout() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            user_tier: default_user_tier(),
            timeout_seconds: default_api_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown(),
            carousel_interval_seconds: default_carousel_interval(),
            recent_news_days: default_recent_news_days(),
        }
    }
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            ip_lookup_url: default_ip_lookup_url(),
            timeout_seconds: default_locate_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl RefreshConfig {
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    #[must_use]
    pub fn carousel_interval(&self) -> Duration {
        Duration::from_secs(self.carousel_interval_seconds)
    }

    #[must_use]
    pub fn recent_news_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.recent_news_days))
    }
}

impl LocateConfig {
    /// The configured fixed position, if both coordinates are set
    #[must_use]
    pub fn fixed_position(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl AppConfig {
    /// Load configuration from the default file location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from the specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.or_else(Self::get_config_path);

        if let Some(config_file) = config_file.filter(|path| path.exists()) {
            tracing::debug!("Reading configuration from {}", config_file.display());
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // HEALTH_EXPOSURE__API__API_KEY=... overrides api.api_key
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build().map_err(|e| {
            HealthExposureError::config(format!("Failed to build configuration: {e}"))
        })?;

        let mut config: AppConfig = settings.try_deserialize().map_err(|e| {
            HealthExposureError::config(format!("Failed to deserialize configuration: {e}"))
        })?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Apply default values to empty or zeroed configuration fields
    pub fn apply_defaults(&mut self) {
        if self.api.base_url.is_empty() {
            self.api.base_url = default_base_url();
        }
        while self.api.base_url.ends_with('/') {
            self.api.base_url.pop();
        }
        if self.api.user_tier.is_empty() {
            self.api.user_tier = default_user_tier();
        }
        self.api.user_tier = self.api.user_tier.to_lowercase();
        if self.api.timeout_seconds == 0 {
            self.api.timeout_seconds = default_api_timeout();
        }
        if self.refresh.carousel_interval_seconds == 0 {
            self.refresh.carousel_interval_seconds = default_carousel_interval();
        }
        if self.refresh.recent_news_days == 0 {
            self.refresh.recent_news_days = default_recent_news_days();
        }
        if self.locate.ip_lookup_url.is_empty() {
            self.locate.ip_lookup_url = default_ip_lookup_url();
        }
        if self.locate.timeout_seconds == 0 {
            self.locate.timeout_seconds = default_locate_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_position()?;
        Ok(())
    }

    /// Validate the API key, when one is configured
    pub fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.api.api_key {
            if api_key.is_empty() {
                return Err(HealthExposureError::config(
                    "API key cannot be empty if provided. Either remove it or provide a valid key.",
                ));
            }

            if api_key.len() < 8 {
                return Err(HealthExposureError::config(
                    "API key appears to be invalid (too short). Please check your API key.",
                ));
            }

            if api_key.len() > 100 {
                return Err(HealthExposureError::config(
                    "API key appears to be invalid (too long). Please check your API key.",
                ));
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.api.timeout_seconds > 300 {
            return Err(HealthExposureError::config(
                "API timeout cannot exceed 300 seconds",
            ));
        }

        if self.api.max_retries > 10 {
            return Err(HealthExposureError::config(
                "API max retries cannot exceed 10",
            ));
        }

        if self.refresh.cooldown_seconds > 86_400 {
            return Err(HealthExposureError::config(
                "Refresh cooldown cannot exceed 86400 seconds (1 day)",
            ));
        }

        if self.refresh.carousel_interval_seconds > 3_600 {
            return Err(HealthExposureError::config(
                "Carousel interval cannot exceed 3600 seconds",
            ));
        }

        if self.refresh.recent_news_days > 365 {
            return Err(HealthExposureError::config(
                "Recent news window cannot exceed 365 days",
            ));
        }

        if self.locate.timeout_seconds > 300 {
            return Err(HealthExposureError::config(
                "Location timeout cannot exceed 300 seconds",
            ));
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(HealthExposureError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(HealthExposureError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        let valid_tiers = ["free", "premium"];
        if !valid_tiers.contains(&self.api.user_tier.as_str()) {
            return Err(HealthExposureError::config(format!(
                "Invalid user tier '{}'. Must be one of: {}",
                self.api.user_tier,
                valid_tiers.join(", ")
            )));
        }

        for (name, url) in [
            ("API base URL", &self.api.base_url),
            ("IP lookup URL", &self.locate.ip_lookup_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(HealthExposureError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                )));
            }
        }

        Ok(())
    }

    fn validate_position(&self) -> Result<()> {
        match (self.locate.latitude, self.locate.longitude) {
            (None, None) => Ok(()),
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(HealthExposureError::config(
                        "Configured latitude must be between -90 and 90",
                    ));
                }
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(HealthExposureError::config(
                        "Configured longitude must be between -180 and 180",
                    ));
                }
                Ok(())
            }
            _ => Err(HealthExposureError::config(
                "Both locate.latitude and locate.longitude must be set for a fixed position",
            )),
        }
    }

    /// Create configuration directory if it doesn't exist
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| HealthExposureError::config("Unable to determine config directory"))?
            .join(APP_DIR);
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    /// Write [`CONFIG_TEMPLATE`] to the default path unless a file is already there
    pub fn write_template() -> Result<PathBuf> {
        let path = Self::ensure_config_dir()?.join("config.toml");
        if path.exists() {
            tracing::info!("Keeping existing configuration at {}", path.display());
        } else {
            std::fs::write(&path, CONFIG_TEMPLATE)?;
            tracing::info!("Wrote configuration template to {}", path.display());
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{MissingReadingPolicy, TapWaterPolicy};
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.user_tier, "free");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.api.max_retries, 0);
        assert_eq!(config.refresh.cooldown_seconds, 300);
        assert_eq!(config.refresh.carousel_interval_seconds, 5);
        assert_eq!(config.refresh.recent_news_days, 30);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.risk.tap_water_unsafe, TapWaterPolicy::High);
        assert_eq!(config.risk.missing_reading, MissingReadingPolicy::AssumeLow);
        assert!(config.api.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_api_key() {
        let mut config = AppConfig::default();
        config.api.api_key = Some("valid_api_key_123".to_string());
        assert!(config.validate_api_key().is_ok());

        config.api.api_key = Some("short".to_string());
        let err = config.validate_api_key().unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_user_tier() {
        let mut config = AppConfig::default();
        config.api.user_tier = "gold".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid user tier"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = AppConfig::default();
        config.api.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_half_configured_position_is_rejected() {
        let mut config = AppConfig::default();
        config.locate.latitude = Some(51.5);
        assert!(config.validate().is_err());

        config.locate.longitude = Some(-0.12);
        assert!(config.validate().is_ok());
        assert_eq!(config.locate.fixed_position(), Some((51.5, -0.12)));
    }

    #[test]
    fn test_apply_defaults_fills_zeroes() {
        let mut config = AppConfig::default();
        config.api.base_url = "https://example.test/prod/".to_string();
        config.api.user_tier = "PREMIUM".to_string();
        config.api.timeout_seconds = 0;
        config.refresh.carousel_interval_seconds = 0;
        config.apply_defaults();

        assert_eq!(config.api.base_url, "https://example.test/prod");
        assert_eq!(config.api.user_tier, "premium");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.refresh.carousel_interval_seconds, 5);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "http://localhost:9000"
user_tier = "premium"

[refresh]
cooldown_seconds = 120

[risk]
tap_water_unsafe = "moderate"
missing_reading = "unknown"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9000");
        assert_eq!(config.api.user_tier, "premium");
        assert_eq!(config.refresh.cooldown_seconds, 120);
        // untouched sections keep their defaults
        assert_eq!(config.refresh.carousel_interval_seconds, 5);
        assert_eq!(config.risk.tap_water_unsafe, TapWaterPolicy::Moderate);
        assert_eq!(config.risk.missing_reading, MissingReadingPolicy::Unknown);
    }

    #[test]
    fn test_template_loads_cleanly() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(CONFIG_TEMPLATE.as_bytes()).unwrap();

        let config = AppConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.refresh.cooldown_seconds, 300);
        assert!(config.locate.fixed_position().is_none());
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = AppConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("health-exposure"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
