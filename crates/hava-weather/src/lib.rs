//! Weather data for Hava
//!
//! Open-Meteo forecasts, a per-coordinate snapshot cache, and the one-shot
//! geolocation contract used by the current-location feature.

pub mod cache;
pub mod location;
pub mod provider;
pub mod service;
pub mod types;

pub use cache::{CachedSnapshot, WeatherCache};
pub use location::{
    locate, FixedPositionSource, Position, PositionOptions, PositionSource,
    UnavailablePositionSource,
};
pub use provider::{OpenMeteoClient, WeatherSource};
pub use service::{SnapshotOrigin, WeatherService, WeatherView};
pub use types::*;
