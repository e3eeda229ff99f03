use hava_core::{AppError, ConfigError};
use hava_places::{CatalogError, Unresolved};

use super::IntoAppError;

impl IntoAppError for Unresolved {
    fn into_app_error(self) -> AppError {
        AppError::LocationUnresolved {
            distance_km: self.min_distance_km,
        }
    }
}

// The dataset path comes from configuration.
impl IntoAppError for CatalogError {
    fn into_app_error(self) -> AppError {
        AppError::Config(ConfigError::Invalid(self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_keeps_distance() {
        let err = Unresolved {
            min_distance_km: Some(200.4),
        }
        .into_app_error();
        assert!(matches!(
            err,
            AppError::LocationUnresolved { distance_km: Some(d) } if d == 200.4
        ));
    }
}
