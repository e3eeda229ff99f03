//! User preferences and cached permission states.

use std::sync::Arc;

use hava_core::KeyValueStore;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::persisted::{PersistedStore, StoreError};

pub const SETTINGS_KEY: &str = "settings";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Last known answer to a platform permission prompt.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    #[default]
    Prompt,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub location_services_enabled: bool,
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub theme: Theme,
    pub geolocation_permission: PermissionState,
    pub notification_permission: PermissionState,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location_services_enabled: true,
            notifications_enabled: false,
            sound_enabled: true,
            theme: Theme::System,
            geolocation_permission: PermissionState::Prompt,
            notification_permission: PermissionState::Prompt,
        }
    }
}

pub struct SettingsStore {
    inner: PersistedStore<Settings>,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: PersistedStore::new(backend, SETTINGS_KEY),
        }
    }

    /// Fresh read of the persisted settings.
    pub fn get(&self) -> Settings {
        self.inner.get()
    }

    pub fn set(&self, settings: Settings) -> Result<(), StoreError> {
        self.inner.set(settings)
    }

    pub fn update(&self, f: impl FnOnce(&mut Settings)) -> Result<(), StoreError> {
        self.inner.update(f)
    }

    pub fn location_services_enabled(&self) -> bool {
        self.get().location_services_enabled
    }

    pub fn set_location_services_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.update(|s| s.location_services_enabled = enabled)
    }

    pub fn notifications_enabled(&self) -> bool {
        self.get().notifications_enabled
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.update(|s| s.notifications_enabled = enabled)
    }

    pub fn sound_enabled(&self) -> bool {
        self.get().sound_enabled
    }

    pub fn set_sound_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.update(|s| s.sound_enabled = enabled)
    }

    pub fn theme(&self) -> Theme {
        self.get().theme
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.update(|s| s.theme = theme)
    }

    pub fn geolocation_permission(&self) -> PermissionState {
        self.get().geolocation_permission
    }

    pub fn set_geolocation_permission(&self, state: PermissionState) -> Result<(), StoreError> {
        self.update(|s| s.geolocation_permission = state)
    }

    pub fn notification_permission(&self) -> PermissionState {
        self.get().notification_permission
    }

    pub fn set_notification_permission(&self, state: PermissionState) -> Result<(), StoreError> {
        self.update(|s| s.notification_permission = state)
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
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
    use hava_core::MemoryStore;

    #[test]
    fn test_defaults() {
        let store = SettingsStore::new(Arc::new(MemoryStore::new()));
        let settings = store.get();
        assert!(settings.location_services_enabled);
        assert!(!settings.notifications_enabled);
        assert!(settings.sound_enabled);
        assert_eq!(settings.theme, Theme::System);
        assert_eq!(settings.notification_permission, PermissionState::Prompt);
    }

    #[test]
    fn test_setters_persist_under_one_key() {
        let backend = Arc::new(MemoryStore::new());
        let store = SettingsStore::new(backend.clone());

        store.set_theme(Theme::Dark).unwrap();
        store.set_notifications_enabled(true).unwrap();
        store
            .set_notification_permission(PermissionState::Granted)
            .unwrap();

        let raw = backend.get(SETTINGS_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["notifications_enabled"], true);
        assert_eq!(json["notification_permission"], "granted");
    }

    #[test]
    fn test_partial_object_fills_defaults() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set(SETTINGS_KEY, r#"{"sound_enabled": false}"#)
            .unwrap();

        let store = SettingsStore::new(backend);
        assert!(!store.sound_enabled());
        assert!(store.location_services_enabled());
    }

    #[test]
    fn test_external_edit_seen_on_next_read() {
        let backend = Arc::new(MemoryStore::new());
        let store = SettingsStore::new(backend.clone());
        assert!(!store.notifications_enabled());

        backend
            .set(SETTINGS_KEY, r#"{"notifications_enabled": true}"#)
            .unwrap();
        assert!(store.notifications_enabled());
    }
}
