//! Display-path weather loading: snapshot cache in front of a [`WeatherSource`].
//!
//! The alerting path talks to the source directly; only what the user looks
//! at is served from cache.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::cache::WeatherCache;
use crate::provider::WeatherSource;
use crate::types::{WeatherError, WeatherSnapshot};

/// Where a displayed snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    Live,
    Cache,
}

#[derive(Debug, Clone)]
pub struct WeatherView {
    pub snapshot: WeatherSnapshot,
    pub fetched_at: DateTime<Utc>,
    pub origin: SnapshotOrigin,
}

pub struct WeatherService<S> {
    source: S,
    cache: Mutex<WeatherCache>,
}

impl<S: WeatherSource> WeatherService<S> {
    pub fn new(source: S, cache: WeatherCache) -> Self {
        Self {
            source,
            cache: Mutex::new(cache),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Serve a fresh cached snapshot if there is one, otherwise fetch.
    pub async fn load(&self, latitude: f64, longitude: f64) -> Result<WeatherView, WeatherError> {
        if let Some(view) = self.cached(latitude, longitude) {
            tracing::debug!("Serving cached weather for {:.4},{:.4}", latitude, longitude);
            return Ok(view);
        }
        self.fetch_and_store(latitude, longitude).await
    }

    /// Always fetch; fall back to a fresh cached snapshot if the fetch fails.
    pub async fn refresh(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherView, WeatherError> {
        match self.fetch_and_store(latitude, longitude).await {
            Ok(view) => Ok(view),
            Err(e) => match self.cached(latitude, longitude) {
                Some(view) => {
                    tracing::warn!("Weather refresh failed, showing cached data: {}", e);
                    Ok(view)
                }
                None => Err(e),
            },
        }
    }

    fn cached(&self, latitude: f64, longitude: f64) -> Option<WeatherView> {
        self.cache
            .lock()
            .get_fresh(latitude, longitude)
            .map(|entry| WeatherView {
                snapshot: entry.snapshot.clone(),
                fetched_at: entry.fetched_at,
                origin: SnapshotOrigin::Cache,
            })
    }

    async fn fetch_and_store(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherView, WeatherError> {
        let snapshot = self.source.fetch(latitude, longitude).await?;
        let fetched_at = Utc::now();
        self.cache
            .lock()
            .store_for(latitude, longitude, snapshot.clone(), fetched_at);
        Ok(WeatherView {
            snapshot,
            fetched_at,
            origin: SnapshotOrigin::Live,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::cache::tests::snapshot_at;
    use crate::cache::DEFAULT_TTL_SECS;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FlakySource {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl WeatherSource for FlakySource {
        async fn fetch(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<WeatherSnapshot, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(WeatherError::Status(503))
            } else {
                Ok(snapshot_at(latitude, longitude))
            }
        }
    }

    fn service() -> WeatherService<FlakySource> {
        WeatherService::new(FlakySource::default(), WeatherCache::in_memory(DEFAULT_TTL_SECS))
    }

    #[tokio::test]
    async fn test_load_uses_cache_when_fresh() {
        let service = service();

        let first = service.load(41.01, 28.97).await.unwrap();
        assert_eq!(first.origin, SnapshotOrigin::Live);

        let second = service.load(41.01, 28.97).await.unwrap();
        assert_eq!(second.origin, SnapshotOrigin::Cache);
        assert_eq!(service.source().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_falls_back_to_fresh_cache() {
        let service = service();
        service.load(41.01, 28.97).await.unwrap();

        service.source().failing.store(true, Ordering::SeqCst);
        let view = service.refresh(41.01, 28.97).await.unwrap();
        assert_eq!(view.origin, SnapshotOrigin::Cache);
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_reported() {
        let service = service();
        service.source().failing.store(true, Ordering::SeqCst);

        let result = service.load(41.01, 28.97).await;
        assert!(matches!(result, Err(WeatherError::Status(503))));
    }
}
