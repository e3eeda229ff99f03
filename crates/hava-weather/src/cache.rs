//! Per-coordinate snapshot cache, persisted as JSON in the config directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{WeatherError, WeatherSnapshot};

const CACHE_FILE: &str = "weather_cache.json";
pub const DEFAULT_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedSnapshot {
    pub snapshot: WeatherSnapshot,
    pub fetched_at: DateTime<Utc>,
}

impl CachedSnapshot {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }
}

#[derive(Debug)]
pub struct WeatherCache {
    cache_path: Option<PathBuf>,
    ttl: Duration,
    entries: HashMap<String, CachedSnapshot>,
}

impl WeatherCache {
    /// Open the cache file in `config_dir`. A missing or unreadable file
    /// yields an empty cache; expired entries are dropped on load.
    pub fn open(config_dir: &Path, ttl_secs: i64) -> Self {
        let cache_path = config_dir.join(CACHE_FILE);
        let entries = match std::fs::read_to_string(&cache_path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable weather cache: {}", e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        let mut cache = Self {
            cache_path: Some(cache_path),
            ttl: Duration::seconds(ttl_secs),
            entries,
        };
        let dropped = cache.prune(Utc::now());
        if dropped > 0 {
            tracing::debug!("Dropped {} expired weather cache entries", dropped);
        }
        cache
    }

    /// Cache that is never written to disk.
    pub fn in_memory(ttl_secs: i64) -> Self {
        Self {
            cache_path: None,
            ttl: Duration::seconds(ttl_secs),
            entries: HashMap::new(),
        }
    }

    pub fn key(latitude: f64, longitude: f64) -> String {
        format!("{:.4},{:.4}", latitude, longitude)
    }

    /// Entry for the coordinate if it is no older than the TTL.
    pub fn get_fresh(&self, latitude: f64, longitude: f64) -> Option<&CachedSnapshot> {
        self.get_fresh_at(latitude, longitude, Utc::now())
    }

    pub fn get_fresh_at(
        &self,
        latitude: f64,
        longitude: f64,
        now: DateTime<Utc>,
    ) -> Option<&CachedSnapshot> {
        self.entries
            .get(&Self::key(latitude, longitude))
            .filter(|entry| entry.age(now) <= self.ttl)
    }

    pub fn store(&mut self, snapshot: WeatherSnapshot, fetched_at: DateTime<Utc>) {
        let key = Self::key(snapshot.latitude, snapshot.longitude);
        self.store_keyed(key, snapshot, fetched_at);
    }

    /// Store under the requested coordinate; the API snaps coordinates to its
    /// grid, so the response position can differ from the query.
    pub fn store_for(
        &mut self,
        latitude: f64,
        longitude: f64,
        snapshot: WeatherSnapshot,
        fetched_at: DateTime<Utc>,
    ) {
        self.store_keyed(Self::key(latitude, longitude), snapshot, fetched_at);
    }

    fn store_keyed(&mut self, key: String, snapshot: WeatherSnapshot, fetched_at: DateTime<Utc>) {
        self.entries.insert(
            key,
            CachedSnapshot {
                snapshot,
                fetched_at,
            },
        );
        self.prune(Utc::now());
        if let Err(e) = self.save() {
            tracing::warn!("Failed to persist weather cache: {}", e);
        }
    }

    /// Drop entries past their TTL.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.age(now) <= ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<(), WeatherError> {
        let Some(path) = &self.cache_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WeatherError::Cache(e.to_string()))?;
        }
        let json =
            serde_json::to_string(&self.entries).map_err(|e| WeatherError::Cache(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| WeatherError::Cache(e.to_string()))
    }
}
