//! "Current location": device position → nearest district → weather.

use std::sync::Arc;

use hava_core::{AppError, Capability};
use hava_places::{District, LocationCatalog, NearestLocationResolver};
use hava_weather::{
    locate, LocationError, Position, PositionOptions, PositionSource, WeatherService, WeatherSource,
    WeatherView,
};

use crate::error_mapping::IntoAppError;
use crate::favorites::FavoriteLocation;
use crate::settings::{PermissionState, SettingsStore};

#[derive(Debug, Clone)]
pub struct CurrentLocation {
    pub province: String,
    pub district: District,
    pub distance_km: f64,
    pub position: Position,
    pub weather: WeatherView,
}

impl CurrentLocation {
    pub fn label(&self) -> String {
        format!("{} / {}", self.province, self.district.name)
    }

    /// The resolved district as a favorite, for the "add to favorites" action.
    pub fn to_favorite(&self) -> FavoriteLocation {
        FavoriteLocation::new(
            self.province.clone(),
            self.district.name.clone(),
            self.district.lat,
            self.district.lon,
        )
    }
}

pub struct CurrentLocationService<P, S> {
    positions: P,
    weather: Arc<WeatherService<S>>,
    catalog: Arc<LocationCatalog>,
    settings: Arc<SettingsStore>,
    resolver: NearestLocationResolver,
    options: PositionOptions,
}

impl<P: PositionSource, S: WeatherSource> CurrentLocationService<P, S> {
    pub fn new(
        positions: P,
        weather: Arc<WeatherService<S>>,
        catalog: Arc<LocationCatalog>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            positions,
            weather,
            catalog,
            settings,
            resolver: NearestLocationResolver::default(),
            options: PositionOptions::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: NearestLocationResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    /// One lookup. Failures are final; the caller offers a manual retry.
    pub async fn lookup(&self) -> Result<CurrentLocation, AppError> {
        let settings = self.settings.get();
        if !settings.location_services_enabled {
            return Err(AppError::LocationServicesDisabled);
        }
        // Never re-prompt after a denial; the user has to change it in settings.
        if settings.geolocation_permission == PermissionState::Denied {
            return Err(AppError::PermissionDenied(Capability::Geolocation));
        }

        let position = match locate(&self.positions, &self.options).await {
            Ok(position) => {
                self.remember_permission(PermissionState::Granted);
                position
            }
            Err(LocationError::PermissionDenied) => {
                self.remember_permission(PermissionState::Denied);
                return Err(LocationError::PermissionDenied.into_app_error());
            }
            Err(e) => return Err(e.into_app_error()),
        };

        let nearest = self
            .resolver
            .resolve(
                position.location.latitude,
                position.location.longitude,
                &self.catalog,
            )
            .map_err(IntoAppError::into_app_error)?;

        let weather = self
            .weather
            .load(nearest.district.lat, nearest.district.lon)
            .await
            .map_err(IntoAppError::into_app_error)?;

        Ok(CurrentLocation {
            province: nearest.province,
            district: nearest.district,
            distance_km: nearest.distance_km,
            position,
            weather,
        })
    }

    fn remember_permission(&self, state: PermissionState) {
        if self.settings.geolocation_permission() == state {
            return;
        }
        if let Err(e) = self.settings.set_geolocation_permission(state) {
            tracing::warn!("Failed to cache geolocation permission: {}", e);
        }
    }
}
