//! User-pinned districts monitored for severe weather.

use std::sync::Arc;

use hava_core::KeyValueStore;
use hava_places::fold_case;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::persisted::{PersistedStore, StoreError};

pub const FAVORITES_KEY: &str = "favorites";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteLocation {
    pub province: String,
    pub district: String,
    pub lat: f64,
    pub lon: f64,
}

impl FavoriteLocation {
    pub fn new(province: impl Into<String>, district: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            province: province.into(),
            district: district.into(),
            lat,
            lon,
        }
    }

    /// Display label, e.g. "İstanbul / Kadıköy".
    pub fn label(&self) -> String {
        format!("{} / {}", self.province, self.district)
    }

    /// Identity: province exact, district case-insensitive.
    pub fn is_same_place(&self, province: &str, district: &str) -> bool {
        self.province == province && fold_case(&self.district) == fold_case(district)
    }
}

pub struct FavoritesStore {
    inner: PersistedStore<Vec<FavoriteLocation>>,
}

impl FavoritesStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: PersistedStore::new(backend, FAVORITES_KEY),
        }
    }

    pub fn list(&self) -> Vec<FavoriteLocation> {
        self.inner.get()
    }

    pub fn set(&self, favorites: Vec<FavoriteLocation>) -> Result<(), StoreError> {
        self.inner.set(favorites)
    }

    /// Append unless the same place is already pinned. Returns whether it
    /// was inserted.
    pub fn add(&self, favorite: FavoriteLocation) -> Result<bool, StoreError> {
        let inserted = self.inner.update(|list| {
            if list
                .iter()
                .any(|f| f.is_same_place(&favorite.province, &favorite.district))
            {
                false
            } else {
                list.push(favorite.clone());
                true
            }
        })?;

        if inserted {
            tracing::info!("Added favorite {}", favorite.label());
        }
        Ok(inserted)
    }

    /// Remove a place. Returns whether anything was removed.
    pub fn remove(&self, province: &str, district: &str) -> Result<bool, StoreError> {
        let removed = self.inner.update(|list| {
            let before = list.len();
            list.retain(|f| !f.is_same_place(province, district));
            list.len() != before
        })?;

        if removed {
            tracing::info!("Removed favorite {} / {}", province, district);
        }
        Ok(removed)
    }

    pub fn contains(&self, province: &str, district: &str) -> bool {
        self.list()
            .iter()
            .any(|f| f.is_same_place(province, district))
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<FavoriteLocation>> {
        self.inner.subscribe()
    }

    pub fn reload(&self) -> bool {
        self.inner.reload()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use hava_core::{MemoryStore, SqliteStore};

    fn kadikoy() -> FavoriteLocation {
        FavoriteLocation::new("İstanbul", "Kadıköy", 40.98, 29.03)
    }

    fn store() -> FavoritesStore {
        FavoritesStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_add_twice_is_idempotent() {
        let store = store();
        assert!(store.add(kadikoy()).unwrap());
        assert!(!store.add(kadikoy()).unwrap());
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_identity_ignores_district_case() {
        let store = store();
        store.add(kadikoy()).unwrap();

        assert!(store.contains("İstanbul", "kadıköy"));
        assert!(!store
            .add(FavoriteLocation::new("İstanbul", "KADıKÖY", 40.98, 29.03))
            .unwrap());
        assert!(!store.contains("istanbul", "Kadıköy"));
    }

    #[test]
    fn test_remove_non_member_is_noop() {
        let store = store();
        store.add(kadikoy()).unwrap();

        assert!(!store.remove("Ankara", "Çankaya").unwrap());
        assert_eq!(store.list(), vec![kadikoy()]);

        assert!(store.remove("İstanbul", "Kadıköy").unwrap());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_keeps_insertion_order() {
        let store = store();
        store.add(kadikoy()).unwrap();
        store
            .add(FavoriteLocation::new("Ankara", "Çankaya", 39.918, 32.863))
            .unwrap();

        let labels: Vec<_> = store.list().iter().map(|f| f.label()).collect();
        assert_eq!(labels, vec!["İstanbul / Kadıköy", "Ankara / Çankaya"]);
    }

    #[test]
    fn test_persists_across_instances() {
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        FavoritesStore::new(backend.clone()).add(kadikoy()).unwrap();

        let reopened = FavoritesStore::new(backend);
        assert!(reopened.contains("İstanbul", "Kadıköy"));
    }

    #[test]
    fn test_shared_database_file_sees_other_writers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hava.db");

        let ours = FavoritesStore::new(Arc::new(SqliteStore::open(&path).unwrap()));
        let theirs = FavoritesStore::new(Arc::new(SqliteStore::open(&path).unwrap()));
        let rx = theirs.subscribe();

        ours.add(kadikoy()).unwrap();

        assert!(theirs.contains("İstanbul", "Kadıköy"));
        assert!(theirs.reload());
        assert_eq!(*rx.borrow(), vec![kadikoy()]);
        assert!(!theirs.reload());

        drop(ours);
        drop(theirs);
        let reopened = FavoritesStore::new(Arc::new(SqliteStore::open(&path).unwrap()));
        assert_eq!(reopened.list(), vec![kadikoy()]);
    }
}
