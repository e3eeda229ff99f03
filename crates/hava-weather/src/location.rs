//! One-shot device position requests.
//!
//! The platform geolocation API sits behind [`PositionSource`]; [`locate`]
//! applies the request timeout and rejects fixes older than the allowed
//! maximum age. There is no automatic retry.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::{Location, LocationError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(15),
            maximum_age: Duration::from_secs(60),
        }
    }
}

/// A position fix and when it was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub location: Location,
    pub timestamp: DateTime<Utc>,
}

pub trait PositionSource: Send + Sync {
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<Position, LocationError>> + Send;
}

/// Request the current position once.
pub async fn locate<P: PositionSource>(
    source: &P,
    options: &PositionOptions,
) -> Result<Position, LocationError> {
    let position = tokio::time::timeout(options.timeout, source.current_position(options))
        .await
        .map_err(|_| {
            tracing::warn!("Geolocation timed out after {:?}", options.timeout);
            LocationError::Timeout
        })??;

    let age = Utc::now() - position.timestamp;
    let max_age = chrono::Duration::from_std(options.maximum_age)
        .unwrap_or_else(|_| chrono::Duration::seconds(60));
    if age > max_age {
        tracing::debug!("Rejecting position fix {}s old", age.num_seconds());
        return Err(LocationError::Stale {
            age_secs: age.num_seconds(),
        });
    }

    tracing::info!(
        "Got location: {:.4}, {:.4}",
        position.location.latitude,
        position.location.longitude
    );
    Ok(position)
}

/// Source for hosts without a geolocation API.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePositionSource;

impl PositionSource for UnavailablePositionSource {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Position, LocationError> {
        Err(LocationError::Unavailable)
    }
}

/// Source that always reports the same coordinate, timestamped now.
#[derive(Debug, Clone, Copy)]
pub struct FixedPositionSource {
    pub latitude: f64,
    pub longitude: f64,
}

impl PositionSource for FixedPositionSource {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Position, LocationError> {
        Ok(Position {
            location: Location {
                latitude: self.latitude,
                longitude: self.longitude,
                accuracy_meters: None,
            },
            timestamp: Utc::now(),
        })
    }
}
