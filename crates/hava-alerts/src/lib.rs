//! Severe-weather alerting for Hava
//!
//! Threshold rules over a forecast snapshot, the platform notification
//! contract, and the polling manager that ties favorites, weather and the
//! notification log together.

pub mod error;
pub mod evaluator;
pub mod manager;
pub mod notifier;

pub use error::AlertError;
pub use evaluator::{
    evaluate, Alert, AlertCondition, HAIL_CODES, HEAVY_RAIN_MM, HEAVY_SNOW_CM, STORM_CODES,
    STRONG_GUST_KMH, STRONG_WIND_KMH,
};
pub use manager::{mode_for, IdleReason, ManagerMode, NotificationManager, Toast};
pub use notifier::{NotifyError, PlatformNotification, PlatformNotifier, TracingNotifier};
