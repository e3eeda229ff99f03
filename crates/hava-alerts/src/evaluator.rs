//! Severe-weather threshold rules.
//!
//! Today's daily aggregates (index 0) and the current condition code are
//! checked against fixed thresholds. Missing values read as zero and never
//! trigger.

use std::fmt;

use hava_weather::{describe_weather_code, today_or_zero, WeatherSnapshot};
use serde::Serialize;

pub const HEAVY_RAIN_MM: f64 = 20.0;
pub const HEAVY_SNOW_CM: f64 = 10.0;
pub const STRONG_WIND_KMH: f64 = 60.0;
pub const STRONG_GUST_KMH: f64 = 80.0;
pub const STORM_CODES: [i32; 3] = [95, 96, 99];
pub const HAIL_CODES: [i32; 2] = [96, 99];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertCondition {
    HeavyRain,
    HeavySnowfall,
    StrongWind,
    VeryStrongGust,
    StormRisk,
    HailRisk,
}

impl AlertCondition {
    pub fn label(&self) -> &'static str {
        match self {
            AlertCondition::HeavyRain => "Heavy Rain",
            AlertCondition::HeavySnowfall => "Heavy Snowfall",
            AlertCondition::StrongWind => "Strong Wind",
            AlertCondition::VeryStrongGust => "Very Strong Gust",
            AlertCondition::StormRisk => "Storm Risk",
            AlertCondition::HailRisk => "Hail Risk",
        }
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub location_label: String,
    pub condition: AlertCondition,
    pub details: String,
}

impl Alert {
    pub fn title(&self) -> String {
        format!("Weather Alert: {}", self.location_label)
    }

    pub fn body(&self) -> String {
        format!("{} expected. Detail: {}", self.condition, self.details)
    }
}

/// Every rule that fires for `snapshot`, in rule order.
pub fn evaluate(location_label: &str, snapshot: &WeatherSnapshot) -> Vec<Alert> {
    let daily = &snapshot.daily;
    let mut alerts = Vec::new();

    let mut push = |hit: Option<(AlertCondition, String)>| {
        if let Some((condition, details)) = hit {
            alerts.push(Alert {
                location_label: location_label.to_string(),
                condition,
                details,
            });
        }
    };

    push(threshold(
        AlertCondition::HeavyRain,
        today_or_zero(&daily.precipitation_sum),
        HEAVY_RAIN_MM,
        "mm",
    ));
    push(threshold(
        AlertCondition::HeavySnowfall,
        today_or_zero(&daily.snowfall_sum),
        HEAVY_SNOW_CM,
        "cm",
    ));
    push(threshold(
        AlertCondition::StrongWind,
        today_or_zero(&daily.wind_speed_10m_max),
        STRONG_WIND_KMH,
        "km/s",
    ));
    push(threshold(
        AlertCondition::VeryStrongGust,
        today_or_zero(&daily.wind_gusts_10m_max),
        STRONG_GUST_KMH,
        "km/s",
    ));
    push(convective(snapshot.current.weather_code.unwrap_or(0)));

    alerts
}

fn threshold(
    condition: AlertCondition,
    value: f64,
    limit: f64,
    unit: &str,
) -> Option<(AlertCondition, String)> {
    (value >= limit).then(|| (condition, format!("{}{}", value, unit)))
}

// Storm codes include the hail codes and are checked first, so 96 and 99
// report as a storm. At most one of the two fires.
fn convective(code: i32) -> Option<(AlertCondition, String)> {
    let condition = if STORM_CODES.contains(&code) {
        AlertCondition::StormRisk
    } else if HAIL_CODES.contains(&code) {
        AlertCondition::HailRisk
    } else {
        return None;
    };
    Some((condition, describe_weather_code(code).to_string()))
}
