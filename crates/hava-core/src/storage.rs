//! Key-value persistence for client state.
//!
//! Favorites, stored notifications and settings are each serialized under a
//! single key. `SqliteStore` is the on-disk backend; `MemoryStore` backs tests
//! and ephemeral sessions.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{DatabaseError, RusqliteErrorExt};

/// A string-keyed store of serialized values.
///
/// Reads always hit the backing storage so a value changed by another process
/// is seen on the next read.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;

    fn remove(&self, key: &str) -> Result<(), DatabaseError>;
}

/// SQLite-backed key-value store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
        let conn = Connection::open(path).context("Failed to open state database")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        tracing::debug!("Opened state database at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                "#,
            )
            .context("Failed to initialize schema")?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.conn
            .lock()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(RusqliteErrorExt::into_database_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn
            .lock()
            .execute(
                r#"
                INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(RusqliteErrorExt::into_database_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .lock()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(RusqliteErrorExt::into_database_error)?;
        Ok(())
    }
}

/// Process-local store; contents are lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get("favorites").unwrap(), None);

        store.set("favorites", "[]").unwrap();
        assert_eq!(store.get("favorites").unwrap().as_deref(), Some("[]"));

        store.set("favorites", "[1]").unwrap();
        assert_eq!(store.get("favorites").unwrap().as_deref(), Some("[1]"));

        store.remove("favorites").unwrap();
        assert_eq!(store.get("favorites").unwrap(), None);

        // removing a missing key is not an error
        store.remove("favorites").unwrap();
    }

    #[test]
    fn test_sqlite_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        exercise(&store);
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn test_sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("hava.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("settings", r#"{"sound_enabled":false}"#).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.get("settings").unwrap().as_deref(),
            Some(r#"{"sound_enabled":false}"#)
        );
    }

    #[test]
    fn test_two_handles_see_each_others_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hava.db");

        let first = SqliteStore::open(&path).unwrap();
        let second = SqliteStore::open(&path).unwrap();

        first.set("favorites", "[\"a\"]").unwrap();
        assert_eq!(second.get("favorites").unwrap().as_deref(), Some("[\"a\"]"));
    }
}
