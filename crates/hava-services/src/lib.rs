//! Client-state services for Hava
//!
//! Persisted stores (favorites, notification history, settings), the
//! current-location lookup, and subscription form validation.

pub mod current_location;
pub mod error_mapping;
pub mod favorites;
pub mod notification_log;
pub mod persisted;
pub mod settings;
pub mod subscription;

pub use current_location::{CurrentLocation, CurrentLocationService};
pub use error_mapping::IntoAppError;
pub use favorites::{FavoriteLocation, FavoritesStore};
pub use notification_log::{
    NotificationKind, NotificationLog, StoredNotification, MAX_NOTIFICATIONS,
};
pub use persisted::{PersistedStore, StoreError};
pub use settings::{PermissionState, Settings, SettingsStore, Theme};
pub use subscription::{Field, FieldError, SubscriptionForm};
