//! Province/district lookup for Hava
//!
//! A read-only catalog loaded once at startup and the haversine
//! nearest-district resolver behind the "current location" feature.

pub mod catalog;
pub mod nearest;

pub use catalog::{fold_case, CatalogError, District, LocationCatalog, Place, Province};
pub use nearest::{
    haversine_km, resolve, NearestDistrict, NearestLocationResolver, Unresolved,
    DEFAULT_ACCEPTANCE_RADIUS_KM, EARTH_RADIUS_KM,
};
