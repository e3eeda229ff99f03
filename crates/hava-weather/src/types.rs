use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear, // Unknown codes default to clear
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }
}

/// Exact WMO code wording, finer-grained than [`WeatherCondition`].
pub fn describe_weather_code(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snowfall",
        73 => "Moderate snowfall",
        75 => "Heavy snowfall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

/// Open-Meteo local timestamps (`timezone=auto`) carry no offset and
/// usually no seconds: `2026-10-18T14:00`.
pub(crate) mod local_time {
    use chrono::{NaiveDateTime, Timelike};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M";
    const FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

    pub(crate) fn parse(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, FORMAT_SECONDS))
    }

    /// Upstream form, with seconds only when they are non-zero.
    pub(crate) fn format(t: &NaiveDateTime) -> String {
        if t.second() == 0 {
            t.format(FORMAT).to_string()
        } else {
            t.format(FORMAT_SECONDS).to_string()
        }
    }

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub(crate) mod vec {
        use super::{format, parse};
        use chrono::NaiveDateTime;
        use serde::{de, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            times: &[NaiveDateTime],
            s: S,
        ) -> Result<S::Ok, S::Error> {
            let mut seq = s.serialize_seq(Some(times.len()))?;
            for t in times {
                seq.serialize_element(&format(t))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Vec<NaiveDateTime>, D::Error> {
            let raw = Vec::<String>::deserialize(d)?;
            raw.iter()
                .map(|s| parse(s).map_err(de::Error::custom))
                .collect()
        }
    }
}

/// Geographic position reported by the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
}

/// Instantaneous conditions at fetch time.
///
/// Field names follow the upstream API; absent values stay `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentConditions {
    #[serde(with = "local_time")]
    pub time: NaiveDateTime,
    #[serde(default)]
    pub temperature_2m: Option<f64>,
    #[serde(default)]
    pub apparent_temperature: Option<f64>,
    #[serde(default)]
    pub relative_humidity_2m: Option<f64>,
    #[serde(default)]
    pub pressure_msl: Option<f64>,
    #[serde(default)]
    pub wind_speed_10m: Option<f64>,
    #[serde(default)]
    pub wind_direction_10m: Option<f64>,
    #[serde(default)]
    pub wind_gusts_10m: Option<f64>,
    #[serde(default)]
    pub precipitation: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<i32>,
    #[serde(default)]
    pub is_day: Option<u8>,
    #[serde(default)]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub uv_index: Option<f64>,
}

impl CurrentConditions {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code.unwrap_or(0))
    }

    /// Missing day/night flag counts as day.
    pub fn is_day(&self) -> bool {
        self.is_day.map_or(true, |flag| flag != 0)
    }
}

/// Hourly forecast; every array is parallel to `time`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HourlySeries {
    #[serde(default, with = "local_time::vec")]
    pub time: Vec<NaiveDateTime>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub visibility: Vec<Option<f64>>,
    #[serde(default)]
    pub is_day: Vec<Option<u8>>,
}

/// One row of [`HourlySeries`].
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub condition: WeatherCondition,
    pub is_day: bool,
}

impl HourlySeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Up to `hours` rows starting at the first slot at or after `from`.
    pub fn upcoming(&self, from: NaiveDateTime, hours: usize) -> Vec<HourlyPoint> {
        let start = self.time.partition_point(|t| *t < from);
        (start..self.len())
            .take(hours)
            .map(|i| HourlyPoint {
                time: self.time[i],
                temperature: value_at(&self.temperature_2m, i),
                precipitation_probability: value_at(&self.precipitation_probability, i),
                condition: WeatherCondition::from_wmo_code(
                    value_at(&self.weather_code, i).unwrap_or(0),
                ),
                is_day: value_at(&self.is_day, i).map_or(true, |flag| flag != 0),
            })
            .collect()
    }

    fn check_lengths(&self, errors: &mut Vec<String>) {
        let n = self.time.len();
        check_len("hourly.temperature_2m", self.temperature_2m.len(), n, errors);
        check_len("hourly.relative_humidity_2m", self.relative_humidity_2m.len(), n, errors);
        check_len(
            "hourly.precipitation_probability",
            self.precipitation_probability.len(),
            n,
            errors,
        );
        check_len("hourly.precipitation", self.precipitation.len(), n, errors);
        check_len("hourly.weather_code", self.weather_code.len(), n, errors);
        check_len("hourly.wind_speed_10m", self.wind_speed_10m.len(), n, errors);
        check_len("hourly.visibility", self.visibility.len(), n, errors);
        check_len("hourly.is_day", self.is_day.len(), n, errors);
    }
}

/// Daily aggregates; index 0 is today in the location's timezone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailySeries {
    #[serde(default)]
    pub time: Vec<NaiveDate>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default, with = "local_time::vec")]
    pub sunrise: Vec<NaiveDateTime>,
    #[serde(default, with = "local_time::vec")]
    pub sunset: Vec<NaiveDateTime>,
    #[serde(default)]
    pub uv_index_max: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub snowfall_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_gusts_10m_max: Vec<Option<f64>>,
}

/// One day of [`DailySeries`].
#[derive(Debug, Clone, PartialEq)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub condition: WeatherCondition,
    pub precipitation_chance: Option<f64>,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Per-day rows for a forecast view, in date order.
    pub fn days(&self) -> Vec<DayForecast> {
        (0..self.len())
            .map(|i| DayForecast {
                date: self.time[i],
                high: value_at(&self.temperature_2m_max, i),
                low: value_at(&self.temperature_2m_min, i),
                condition: WeatherCondition::from_wmo_code(
                    value_at(&self.weather_code, i).unwrap_or(0),
                ),
                precipitation_chance: value_at(&self.precipitation_probability_max, i),
                sunrise: self.sunrise.get(i).copied(),
                sunset: self.sunset.get(i).copied(),
            })
            .collect()
    }

    fn check_lengths(&self, errors: &mut Vec<String>) {
        let n = self.time.len();
        check_len("daily.weather_code", self.weather_code.len(), n, errors);
        check_len("daily.temperature_2m_max", self.temperature_2m_max.len(), n, errors);
        check_len("daily.temperature_2m_min", self.temperature_2m_min.len(), n, errors);
        check_len("daily.sunrise", self.sunrise.len(), n, errors);
        check_len("daily.sunset", self.sunset.len(), n, errors);
        check_len("daily.uv_index_max", self.uv_index_max.len(), n, errors);
        check_len("daily.precipitation_sum", self.precipitation_sum.len(), n, errors);
        check_len("daily.snowfall_sum", self.snowfall_sum.len(), n, errors);
        check_len(
            "daily.precipitation_probability_max",
            self.precipitation_probability_max.len(),
            n,
            errors,
        );
        check_len("daily.wind_speed_10m_max", self.wind_speed_10m_max.len(), n, errors);
        check_len("daily.wind_gusts_10m_max", self.wind_gusts_10m_max.len(), n, errors);
    }
}

/// Value at index `i`; out of range and null both read as `None`.
fn value_at<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

/// Today's value of a daily aggregate, with missing data read as zero.
pub fn today_or_zero(values: &[Option<f64>]) -> f64 {
    value_at(values, 0).unwrap_or(0.0)
}

// Absent arrays (length 0) are allowed; present ones must match `time`.
fn check_len(name: &str, len: usize, expected: usize, errors: &mut Vec<String>) {
    if len != 0 && len != expected {
        errors.push(format!("{} has {} entries, expected {}", name, len, expected));
    }
}

/// One fetched forecast response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub timezone_abbreviation: String,
    #[serde(default)]
    pub utc_offset_seconds: i32,
    pub current: CurrentConditions,
    #[serde(default)]
    pub hourly: HourlySeries,
    #[serde(default)]
    pub daily: DailySeries,
}

impl WeatherSnapshot {
    /// Check that every series array lines up with its time axis.
    pub fn validate(&self) -> Result<(), WeatherError> {
        let mut errors = Vec::new();
        self.hourly.check_lengths(&mut errors);
        self.daily.check_lengths(&mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(WeatherError::Parse(errors.join("; ")))
        }
    }

    /// Today's row, for the current-location summary.
    pub fn today(&self) -> Option<DayForecast> {
        self.daily.days().into_iter().next()
    }
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Position is {age_secs}s old")]
    Stale { age_secs: i64 },
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API returned status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Cache error: {0}")]
    Cache(String),
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use chrono::Timelike;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "latitude": 40.98,
            "longitude": 29.03,
            "timezone": "Europe/Istanbul",
            "timezone_abbreviation": "GMT+3",
            "utc_offset_seconds": 10800,
            "current": {
                "time": "2026-10-18T14:00",
                "interval": 900,
                "temperature_2m": 18.4,
                "weather_code": 3,
                "is_day": 1
            },
            "hourly": {
                "time": ["2026-10-18T13:00", "2026-10-18T14:00", "2026-10-18T15:00"],
                "temperature_2m": [18.0, 18.4, null],
                "weather_code": [3, 61, 95]
            },
            "daily": {
                "time": ["2026-10-18", "2026-10-19"],
                "temperature_2m_max": [21.0, 19.5],
                "temperature_2m_min": [14.2, 13.0],
                "sunrise": ["2026-10-18T07:19", "2026-10-19T07:20"],
                "precipitation_sum": [2.5, null]
            }
        })
    }

    #[test]
    fn test_wmo_code_mapping() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(48), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_wmo_code(66), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_wmo_code(82), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(86), WeatherCondition::Snow);
    }

    #[test]
    fn test_wmo_code_thunderstorm() {
        assert_eq!(WeatherCondition::from_wmo_code(95), WeatherCondition::Thunderstorm);
        assert_eq!(WeatherCondition::from_wmo_code(96), WeatherCondition::Thunderstorm);
        assert_eq!(WeatherCondition::from_wmo_code(99), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_wmo_code_unknown_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_describe_storm_codes() {
        assert_eq!(describe_weather_code(95), "Thunderstorm");
        assert_eq!(describe_weather_code(96), "Thunderstorm with slight hail");
        assert_eq!(describe_weather_code(99), "Thunderstorm with heavy hail");
        assert_eq!(describe_weather_code(42), "Unknown");
    }

    #[test]
    fn test_snapshot_parses_partial_response() {
        let snapshot: WeatherSnapshot = serde_json::from_value(sample_json()).unwrap();
        assert!(snapshot.validate().is_ok());

        assert_eq!(snapshot.current.temperature_2m, Some(18.4));
        assert_eq!(snapshot.current.pressure_msl, None);
        assert_eq!(snapshot.current.condition(), WeatherCondition::Cloudy);
        assert!(snapshot.current.is_day());

        assert_eq!(snapshot.hourly.len(), 3);
        assert_eq!(snapshot.hourly.temperature_2m[2], None);
        assert!(snapshot.hourly.precipitation.is_empty());

        assert_eq!(snapshot.daily.len(), 2);
        assert_eq!(today_or_zero(&snapshot.daily.precipitation_sum), 2.5);
        assert_eq!(today_or_zero(&snapshot.daily.snowfall_sum), 0.0);
    }

    #[test]
    fn test_mismatched_series_is_rejected() {
        let mut json = sample_json();
        json["daily"]["temperature_2m_min"] = serde_json::json!([14.2]);
        let snapshot: WeatherSnapshot = serde_json::from_value(json).unwrap();

        let err = snapshot.validate().unwrap_err();
        assert!(err.to_string().contains("daily.temperature_2m_min"));
    }

    #[test]
    fn test_snapshot_serialization_round_trip() {
        let snapshot: WeatherSnapshot = serde_json::from_value(sample_json()).unwrap();
        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: WeatherSnapshot = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_timestamps_keep_seconds_through_cache_encoding() {
        let mut json = sample_json();
        json["current"]["time"] = serde_json::json!("2026-10-18T14:00:30");
        let snapshot: WeatherSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.current.time.second(), 30);

        let encoded = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(encoded["current"]["time"], "2026-10-18T14:00:30");
        assert_eq!(encoded["hourly"]["time"][0], "2026-10-18T14:00");

        let decoded: WeatherSnapshot = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_hourly_upcoming_starts_at_current_slot() {
        let snapshot: WeatherSnapshot = serde_json::from_value(sample_json()).unwrap();
        let points = snapshot.hourly.upcoming(snapshot.current.time, 24);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].temperature, Some(18.4));
        assert_eq!(points[0].condition, WeatherCondition::Rain);
        assert_eq!(points[1].condition, WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_days_view() {
        let snapshot: WeatherSnapshot = serde_json::from_value(sample_json()).unwrap();
        let today = snapshot.today().unwrap();
        assert_eq!(today.date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(today.high, Some(21.0));
        assert!(today.sunrise.is_some());
        assert_eq!(today.sunset, None);
    }
}
