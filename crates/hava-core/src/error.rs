//! Centralized error types for Hava.
//!
//! Every crate keeps its own `thiserror` enum; these are mapped into
//! [`AppError`] at the service boundary so the presentation layer gets:
//! - a user-facing message (`user_message()`)
//! - the affordance to offer next to it (`recovery()`)
//! - the full error chain for logging (`Display`)

use std::fmt;

use thiserror::Error;

/// Platform capability that sits behind a permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Geolocation,
    Notifications,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Geolocation => write!(f, "Geolocation"),
            Capability::Notifications => write!(f, "Notification"),
        }
    }
}

/// What the UI should offer alongside an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Retrying the same action may succeed.
    Retry,
    /// The fix is a permission or setting change; link to the settings page.
    OpenSettings,
    /// Nothing actionable.
    None,
}

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Weather fetch failed or the response was malformed.
    #[error("Weather data unavailable: {0}")]
    DataUnavailable(String),

    /// The device position could not be obtained (timeout, no fix, stale fix).
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// No catalog district within the acceptance radius.
    #[error("{}", unresolved_message(*distance_km))]
    LocationUnresolved { distance_km: Option<f64> },

    #[error("{0} permission denied")]
    PermissionDenied(Capability),

    #[error("Location services are disabled in settings")]
    LocationServicesDisabled,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

fn unresolved_message(distance_km: Option<f64>) -> String {
    match distance_km {
        Some(d) => format!("No district found nearby (closest is {:.1} km away)", d),
        None => "No district found nearby".to_string(),
    }
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::DataUnavailable(_) => {
                "Weather data could not be loaded. Check your connection and try again."
            }
            AppError::LocationUnavailable(_) => {
                "Your location could not be determined. Try again in a moment."
            }
            AppError::LocationUnresolved { .. } => {
                "Your location is outside the supported area. Pick a district manually."
            }
            AppError::PermissionDenied(Capability::Geolocation) => {
                "Location access is blocked. Allow it in your browser settings."
            }
            AppError::PermissionDenied(Capability::Notifications) => {
                "Notifications are blocked. Allow them in your browser settings."
            }
            AppError::LocationServicesDisabled => {
                "Location services are turned off. Enable them in settings."
            }
            AppError::Validation(_) => "Some fields are invalid. Please check the form.",
            AppError::Database(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }

    /// Which affordance to show next to the message.
    pub fn recovery(&self) -> Recovery {
        match self {
            AppError::DataUnavailable(_)
            | AppError::LocationUnavailable(_)
            | AppError::LocationUnresolved { .. } => Recovery::Retry,
            AppError::PermissionDenied(_) | AppError::LocationServicesDisabled => {
                Recovery::OpenSettings
            }
            AppError::Config(_) => Recovery::OpenSettings,
            AppError::Database(_) | AppError::Io(_) | AppError::Other(_) => Recovery::Retry,
            AppError::Validation(_) => Recovery::None,
        }
    }
}

/// Local persistence errors (SQLite key-value table).
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => {
                "Unable to access local data. Try restarting the app."
            }
            DatabaseError::QueryFailed(_) => "Saving your changes failed. Please try again.",
            DatabaseError::Corruption(_) => {
                "Local data may be corrupted. Consider resetting app data."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                DatabaseError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DatabaseError::ConnectionFailed(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_errors_point_to_settings() {
        let err = AppError::PermissionDenied(Capability::Geolocation);
        assert_eq!(err.recovery(), Recovery::OpenSettings);
        assert!(err.user_message().contains("Location access"));

        let err = AppError::PermissionDenied(Capability::Notifications);
        assert!(err.user_message().contains("Notifications"));
        assert_eq!(err.to_string(), "Notification permission denied");
    }

    #[test]
    fn test_data_errors_offer_retry() {
        assert_eq!(
            AppError::DataUnavailable("timeout".into()).recovery(),
            Recovery::Retry
        );
        assert_eq!(
            AppError::LocationUnresolved { distance_km: Some(120.0) }.recovery(),
            Recovery::Retry
        );
    }

    #[test]
    fn test_unresolved_display_carries_distance() {
        let err = AppError::LocationUnresolved { distance_km: Some(201.26) };
        assert_eq!(
            err.to_string(),
            "No district found nearby (closest is 201.3 km away)"
        );

        let err = AppError::LocationUnresolved { distance_km: None };
        assert_eq!(err.to_string(), "No district found nearby");
    }

    #[test]
    fn test_database_error_conversion() {
        let db_err = DatabaseError::QueryFailed("disk full".into());
        let app_err: AppError = db_err.into();
        assert!(matches!(app_err, AppError::Database(DatabaseError::QueryFailed(_))));
        assert_eq!(
            app_err.user_message(),
            "Saving your changes failed. Please try again."
        );
    }

    #[test]
    fn test_validation_has_no_recovery_action() {
        assert_eq!(AppError::Validation("email".into()).recovery(), Recovery::None);
    }
}
