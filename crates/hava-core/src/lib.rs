pub mod config;
pub mod error;
pub mod storage;

pub use config::{
    AlertsConfig, Config, FixedPosition, LocationConfig, StorageConfig, ValidationResult,
    WeatherConfig,
};
pub use error::{AppError, Capability, ConfigError, DatabaseError, Recovery, RusqliteErrorExt};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};

use anyhow::Result;

/// Initialize logging for the application.
///
/// Honors `RUST_LOG`; defaults to `info`. Calling this twice is an error
/// rather than a panic so embedders can install their own subscriber first.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!("Hava core initialized");
    Ok(())
}
