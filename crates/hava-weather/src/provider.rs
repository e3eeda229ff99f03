//! Forecast source backed by the Open-Meteo API.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::instrument;

use crate::types::{WeatherError, WeatherSnapshot};

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
const FORECAST_PATH: &str = "/v1/forecast";
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const CURRENT_FIELDS: &[&str] = &[
    "temperature_2m",
    "apparent_temperature",
    "relative_humidity_2m",
    "pressure_msl",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
    "precipitation",
    "weather_code",
    "is_day",
    "visibility",
    "uv_index",
];

pub const HOURLY_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "precipitation_probability",
    "precipitation",
    "weather_code",
    "wind_speed_10m",
    "visibility",
    "is_day",
];

pub const DAILY_FIELDS: &[&str] = &[
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "sunrise",
    "sunset",
    "uv_index_max",
    "precipitation_sum",
    "snowfall_sum",
    "precipitation_probability_max",
    "wind_speed_10m_max",
    "wind_gusts_10m_max",
];

/// Anything that can produce a forecast snapshot for a coordinate.
///
/// Implementations report failures as values and never retry; callers own
/// the retry policy.
pub trait WeatherSource: Send + Sync {
    fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<WeatherSnapshot, WeatherError>> + Send;
}

impl<T: WeatherSource> WeatherSource for Arc<T> {
    fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<WeatherSnapshot, WeatherError>> + Send {
        (**self).fetch(latitude, longitude)
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Arc<Client>,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(DEFAULT_BASE_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Client against a custom API root, e.g. a self-hosted instance or a
    /// mock server.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn query(latitude: f64, longitude: f64) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("current", CURRENT_FIELDS.join(",")),
            ("hourly", HOURLY_FIELDS.join(",")),
            ("daily", DAILY_FIELDS.join(",")),
            ("timezone", "auto".to_string()),
        ]
    }
}

impl WeatherSource for OpenMeteoClient {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}{}", self.base_url, FORECAST_PATH);

        let response = self
            .client
            .get(&url)
            .query(&Self::query(latitude, longitude))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Forecast request failed with status {}", status);
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let snapshot: WeatherSnapshot = serde_json::from_str(&body)
            .map_err(|e| WeatherError::Parse(e.to_string()))?;
        snapshot.validate()?;

        tracing::debug!(
            "Fetched forecast for {:.4},{:.4} ({} hourly, {} daily)",
            latitude,
            longitude,
            snapshot.hourly.len(),
            snapshot.daily.len()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_carries_field_selection_and_auto_timezone() {
        let query = OpenMeteoClient::query(40.98, 29.03);
        let get = |key: &str| {
            query
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        };

        assert_eq!(get("latitude").as_deref(), Some("40.98"));
        assert_eq!(get("longitude").as_deref(), Some("29.03"));
        assert_eq!(get("timezone").as_deref(), Some("auto"));
        assert!(get("daily").is_some_and(|d| d.contains("wind_gusts_10m_max")));
        assert!(get("daily").is_some_and(|d| d.contains("snowfall_sum")));
        assert!(get("current").is_some_and(|c| c.contains("weather_code")));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client =
            OpenMeteoClient::with_base_url("http://localhost:8080/", Duration::from_secs(1));
        assert!(client.is_ok_and(|c| c.base_url == "http://localhost:8080"));
    }
}
