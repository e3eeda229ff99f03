//! Persisted notification history with read state.
//!
//! Most recent first, capped at [`MAX_NOTIFICATIONS`]; inserting past the cap
//! evicts the oldest entries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hava_core::KeyValueStore;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::persisted::{PersistedStore, StoreError};

pub const NOTIFICATIONS_KEY: &str = "stored_notifications";
pub const MAX_NOTIFICATIONS: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Alert,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredNotification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub read: bool,
}

impl StoredNotification {
    /// New unread notification stamped now. UUIDv7 ids sort in creation order.
    pub fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            title: title.into(),
            body: body.into(),
            timestamp: Utc::now(),
            location_name: None,
            link: None,
            read: false,
        }
    }

    pub fn with_location(mut self, location_name: impl Into<String>) -> Self {
        self.location_name = Some(location_name.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

pub struct NotificationLog {
    inner: PersistedStore<Vec<StoredNotification>>,
}

impl NotificationLog {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: PersistedStore::new(backend, NOTIFICATIONS_KEY),
        }
    }

    pub fn list(&self) -> Vec<StoredNotification> {
        self.inner.get()
    }

    pub fn push(&self, notification: StoredNotification) -> Result<(), StoreError> {
        self.inner.update(|list| {
            list.insert(0, notification);
            list.truncate(MAX_NOTIFICATIONS);
        })
    }

    /// Record an informational entry, e.g. "Konum eklendi".
    pub fn push_info(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<StoredNotification, StoreError> {
        let notification = StoredNotification::new(NotificationKind::Info, title, body);
        self.push(notification.clone())?;
        Ok(notification)
    }

    /// Returns false if no entry has that id.
    pub fn mark_read(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.update(|list| match list.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        })
    }

    pub fn mark_all_read(&self) -> Result<(), StoreError> {
        self.inner.update(|list| list.iter_mut().for_each(|n| n.read = true))
    }

    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.inner.set(Vec::new())
    }

    pub fn unread_count(&self) -> usize {
        self.list().iter().filter(|n| !n.read).count()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<StoredNotification>> {
        self.inner.subscribe()
    }

    pub fn reload(&self) -> bool {
        self.inner.reload()
    }
}
