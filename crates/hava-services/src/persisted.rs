//! Typed values persisted under a single key.
//!
//! Every read goes to the backend so edits made by another process are
//! picked up. Writes go to the backend first and are then published to
//! in-process observers through a `watch` channel.

use std::sync::Arc;

use hava_core::{DatabaseError, KeyValueStore};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct PersistedStore<T> {
    backend: Arc<dyn KeyValueStore>,
    key: &'static str,
    tx: watch::Sender<T>,
    // Serializes read-modify-write within this process. Other processes
    // writing the same key are last-writer-wins.
    write_lock: Mutex<()>,
}

impl<T> PersistedStore<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(backend: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        let initial = read(backend.as_ref(), key);
        let (tx, _rx) = watch::channel(initial);
        Self {
            backend,
            key,
            tx,
            write_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Current persisted value. Absent or unreadable state yields the default.
    pub fn get(&self) -> T {
        read(self.backend.as_ref(), self.key)
    }

    /// Write through to the backend, then notify observers.
    pub fn set(&self, value: T) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        self.write(value)
    }

    /// Read-modify-write. The closure's return value is passed back.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError> {
        let _guard = self.write_lock.lock();
        let mut value = self.get();
        let result = f(&mut value);
        self.write(value)?;
        Ok(result)
    }

    /// Observe changes. The receiver starts at the last published value.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Re-read persisted state and publish it if it differs from what
    /// observers last saw. Returns whether anything changed.
    pub fn reload(&self) -> bool {
        let current = self.get();
        self.tx.send_if_modified(|seen| {
            if *seen == current {
                false
            } else {
                *seen = current;
                true
            }
        })
    }

    fn write(&self, value: T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&value)?;
        self.backend.set(self.key, &raw)?;
        self.tx.send_if_modified(|seen| {
            if *seen == value {
                false
            } else {
                *seen = value;
                true
            }
        });
        Ok(())
    }
}

fn read<T: DeserializeOwned + Default>(backend: &dyn KeyValueStore, key: &str) -> T {
    match backend.get(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable value for '{}': {}", key, e);
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!("Failed to read '{}': {}", key, e);
            T::default()
        }
    }
}
