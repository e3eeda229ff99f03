use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use hava_alerts::{NotificationManager, TracingNotifier};
use hava_core::{Config, KeyValueStore, SqliteStore};
use hava_places::{LocationCatalog, NearestLocationResolver};
use hava_services::{
    CurrentLocationService, FavoritesStore, IntoAppError, NotificationLog, SettingsStore,
};
use hava_weather::{
    FixedPositionSource, OpenMeteoClient, PositionOptions, PositionSource,
    UnavailablePositionSource, WeatherCache, WeatherService,
};

const UPCOMING_HOURS: usize = 6;

/// Process-wide services and the background alert task.
pub struct App {
    config: Arc<Config>,
    catalog: Arc<LocationCatalog>,
    favorites: Arc<FavoritesStore>,
    log: Arc<NotificationLog>,
    settings: Arc<SettingsStore>,
    weather: Arc<WeatherService<OpenMeteoClient>>,
    manager: Arc<NotificationManager<OpenMeteoClient, TracingNotifier>>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let backend: Arc<dyn KeyValueStore> = Arc::new(
            SqliteStore::open(config.database_path()).context("Failed to open state database")?,
        );
        let favorites = Arc::new(FavoritesStore::new(backend.clone()));
        let log = Arc::new(NotificationLog::new(backend.clone()));
        let settings = Arc::new(SettingsStore::new(backend));

        let catalog = match &config.location.dataset_path {
            Some(path) => LocationCatalog::load(path),
            None => LocationCatalog::bundled(),
        }
        .map_err(|e| e.into_app_error())
        .context("Failed to load district dataset")?;

        let client = OpenMeteoClient::with_base_url(
            &config.weather.api_url,
            Duration::from_secs(config.weather.request_timeout_secs),
        )
        .context("Failed to build weather client")?;

        let cache_ttl = i64::try_from(config.weather.cache_ttl_secs).unwrap_or(i64::MAX);
        let weather = Arc::new(WeatherService::new(
            client.clone(),
            WeatherCache::open(&config.config_dir, cache_ttl),
        ));

        // Alerting always fetches live; only the display path goes through the cache.
        let manager = Arc::new(NotificationManager::new(
            client,
            TracingNotifier,
            favorites.clone(),
            log.clone(),
            settings.clone(),
            &config.alerts,
        ));

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            favorites,
            log,
            settings,
            weather,
            manager,
            shutdown: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }

    pub async fn start(&mut self) {
        tracing::info!(
            "Loaded {} districts; {} favorite(s), {} unread notification(s)",
            self.catalog.district_count(),
            self.favorites.list().len(),
            self.log.unread_count()
        );
        tracing::info!("Alert manager mode: {:?}", self.manager.mode());

        let manager = self.manager.clone();
        let shutdown = self.shutdown.clone();
        self.tasks.push(tokio::spawn(async move {
            manager.run(shutdown).await;
        }));

        match self.config.location.fixed_position {
            Some(p) => {
                self.report_current_location(FixedPositionSource {
                    latitude: p.latitude,
                    longitude: p.longitude,
                })
                .await
            }
            None => self.report_current_location(UnavailablePositionSource).await,
        }
    }

    async fn report_current_location<P: PositionSource>(&self, positions: P) {
        let location = &self.config.location;
        let service = CurrentLocationService::new(
            positions,
            self.weather.clone(),
            self.catalog.clone(),
            self.settings.clone(),
        )
        .with_resolver(NearestLocationResolver::with_radius(location.acceptance_radius_km))
        .with_options(PositionOptions {
            enable_high_accuracy: location.high_accuracy,
            timeout: Duration::from_secs(location.timeout_secs),
            maximum_age: Duration::from_secs(location.maximum_age_secs),
        });

        match service.lookup().await {
            Ok(current) => {
                let now = &current.weather.snapshot.current;
                tracing::info!(
                    "Current location: {} ({:.1} km), {}, {:.1}°C ({:?})",
                    current.label(),
                    current.distance_km,
                    now.condition().description(),
                    now.temperature_2m.unwrap_or_default(),
                    current.weather.origin
                );

                let snapshot = &current.weather.snapshot;
                if let Some(today) = snapshot.today() {
                    tracing::info!(
                        "Today: {}, {:.0}°C / {:.0}°C",
                        today.condition.description(),
                        today.high.unwrap_or_default(),
                        today.low.unwrap_or_default()
                    );
                }
                for hour in snapshot.hourly.upcoming(now.time, UPCOMING_HOURS) {
                    tracing::debug!(
                        "{}: {}, {:.1}°C",
                        hour.time.format("%H:%M"),
                        hour.condition.description(),
                        hour.temperature.unwrap_or_default()
                    );
                }
            }
            Err(e) => {
                tracing::info!("Current location unavailable: {} ({:?})", e, e.recovery());
            }
        }
    }

    /// Cancel background work and wait for it to finish.
    pub async fn shutdown(mut self) {
        tracing::info!("Shutting down");
        self.shutdown.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::error!("Background task failed: {}", e);
            }
        }
    }
}
