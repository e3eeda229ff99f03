use hava_core::{AppError, Capability};
use hava_weather::{LocationError, WeatherError};

use super::IntoAppError;

impl IntoAppError for WeatherError {
    fn into_app_error(self) -> AppError {
        AppError::DataUnavailable(self.to_string())
    }
}

impl IntoAppError for LocationError {
    fn into_app_error(self) -> AppError {
        match self {
            LocationError::PermissionDenied => AppError::PermissionDenied(Capability::Geolocation),
            LocationError::Unavailable | LocationError::Timeout | LocationError::Stale { .. } => {
                AppError::LocationUnavailable(self.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hava_core::Recovery;

    #[test]
    fn test_weather_failures_are_retryable() {
        let err = WeatherError::Status(503).into_app_error();
        assert!(matches!(err, AppError::DataUnavailable(_)));
        assert_eq!(err.recovery(), Recovery::Retry);
    }

    #[test]
    fn test_location_denial_points_to_settings() {
        let err = LocationError::PermissionDenied.into_app_error();
        assert!(matches!(err, AppError::PermissionDenied(Capability::Geolocation)));
        assert_eq!(err.recovery(), Recovery::OpenSettings);

        let err = LocationError::Timeout.into_app_error();
        assert_eq!(err.recovery(), Recovery::Retry);
    }
}
