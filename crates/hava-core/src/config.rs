use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory (database, weather cache)
    pub config_dir: PathBuf,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub alerts: AlertsConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Forecast API base URL (the `/v1/forecast` path is appended)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long a cached snapshot counts as fresh
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_api_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_cache_ttl() -> u64 {
    3600
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Minutes between severe-weather polling passes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u32,

    /// Icon attached to platform notifications
    #[serde(default = "default_icon_path")]
    pub icon_path: String,

    /// Page opened when a notification is clicked
    #[serde(default = "default_target_url")]
    pub target_url: String,
}

fn default_poll_interval() -> u32 {
    10
}

fn default_icon_path() -> String {
    "/icons/icon-192x192.png".to_string()
}

fn default_target_url() -> String {
    "/bildirimler".to_string()
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            poll_interval_minutes: default_poll_interval(),
            icon_path: default_icon_path(),
            target_url: default_target_url(),
        }
    }
}

/// A fixed device position, used where no platform geolocation exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FixedPosition {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Maximum distance for the nearest-district match
    #[serde(default = "default_acceptance_radius")]
    pub acceptance_radius_km: f64,

    #[serde(default = "default_true")]
    pub high_accuracy: bool,

    #[serde(default = "default_geolocation_timeout")]
    pub timeout_secs: u64,

    /// Oldest acceptable cached position
    #[serde(default = "default_maximum_age")]
    pub maximum_age_secs: u64,

    /// Province/district dataset; the bundled table is used when unset
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,

    #[serde(default)]
    pub fixed_position: Option<FixedPosition>,
}

fn default_acceptance_radius() -> f64 {
    75.0
}

fn default_true() -> bool {
    true
}

fn default_geolocation_timeout() -> u64 {
    15
}

fn default_maximum_age() -> u64 {
    60
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            acceptance_radius_km: default_acceptance_radius(),
            high_accuracy: true,
            timeout_secs: default_geolocation_timeout(),
            maximum_age_secs: default_maximum_age(),
            dataset_path: None,
            fixed_position: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file holding favorites, notifications and settings
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

fn default_database_file() -> String {
    "hava.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hava");

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            alerts: AlertsConfig::default(),
            location: LocationConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.api_url, "weather.api_url", &mut result);

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.weather.cache_ttl_secs == 0 {
            result.add_warning("weather.cache_ttl_secs", "Weather caching disabled (0 seconds)");
        }

        if self.alerts.poll_interval_minutes == 0 {
            result.add_error(
                "alerts.poll_interval_minutes",
                "Polling interval must be greater than 0",
            );
        } else if self.alerts.poll_interval_minutes > 1440 {
            result.add_warning(
                "alerts.poll_interval_minutes",
                "Polling interval is more than 24 hours",
            );
        }

        if !(self.location.acceptance_radius_km > 0.0) {
            result.add_error(
                "location.acceptance_radius_km",
                "Acceptance radius must be a positive number",
            );
        }

        if self.location.timeout_secs == 0 {
            result.add_error("location.timeout_secs", "Geolocation timeout must be greater than 0");
        }

        if let Some(path) = &self.location.dataset_path {
            if !path.is_file() {
                result.add_error(
                    "location.dataset_path",
                    format!("Dataset file not found: {}", path.display()),
                );
            }
        }

        if let Some(pos) = self.location.fixed_position {
            if !(-90.0..=90.0).contains(&pos.latitude) || !(-180.0..=180.0).contains(&pos.longitude)
            {
                result.add_error(
                    "location.fixed_position",
                    "Coordinates out of range (latitude ±90, longitude ±180)",
                );
            }
        }

        if self.storage.database_file.trim().is_empty() {
            result.add_error("storage.database_file", "Database file name is empty");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }
                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Path of the SQLite database inside the config directory
    pub fn database_path(&self) -> PathBuf {
        self.config_dir.join(&self.storage.database_file)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("hava");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_default_intervals_match_alerting_rules() {
        let config = Config::default();
        assert_eq!(config.alerts.poll_interval_minutes, 10);
        assert_eq!(config.weather.cache_ttl_secs, 3600);
        assert_eq!(config.location.acceptance_radius_km, 75.0);
        assert_eq!(config.location.timeout_secs, 15);
        assert_eq!(config.location.maximum_age_secs, 60);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.weather.api_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.api_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.weather.api_url = "ftp://api.open-meteo.com".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_poll_interval_is_error() {
        let mut config = Config::default();
        config.alerts.poll_interval_minutes = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "alerts.poll_interval_minutes"));
    }

    #[test]
    fn test_zero_cache_ttl_is_warning() {
        let mut config = Config::default();
        config.weather.cache_ttl_secs = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.cache_ttl_secs"));
    }

    #[test]
    fn test_fixed_position_out_of_range() {
        let mut config = Config::default();
        config.location.fixed_position = Some(FixedPosition {
            latitude: 91.0,
            longitude: 29.0,
        });
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "location.fixed_position"));
    }

    #[test]
    fn test_missing_dataset_file() {
        let mut config = Config::default();
        config.location.dataset_path = Some(PathBuf::from("/nonexistent/districts.json"));
        let result = config.validate();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_load_from_creates_default_then_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hava").join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.weather.api_url, created.weather.api_url);
        assert_eq!(loaded.alerts.poll_interval_minutes, 10);
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/hava\"\n\n[alerts]\npoll_interval_minutes = 5\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.alerts.poll_interval_minutes, 5);
        assert_eq!(config.alerts.target_url, "/bildirimler");
        assert_eq!(config.storage.database_file, "hava.db");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/hava/hava.db"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
