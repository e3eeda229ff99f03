//! Nearest catalog district to a device position.

use thiserror::Error;

use crate::catalog::{District, LocationCatalog};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_ACCEPTANCE_RADIUS_KM: f64 = 75.0;

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearestDistrict {
    pub province: String,
    pub district: District,
    pub distance_km: f64,
}

/// No district within the acceptance radius.
///
/// `min_distance_km` is the closest candidate's distance, kept for
/// diagnostics; `None` when the catalog had no usable coordinates at all.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("no district within range")]
pub struct Unresolved {
    pub min_distance_km: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct NearestLocationResolver {
    radius_km: f64,
}

impl Default for NearestLocationResolver {
    fn default() -> Self {
        Self::with_radius(DEFAULT_ACCEPTANCE_RADIUS_KM)
    }
}

impl NearestLocationResolver {
    pub fn with_radius(radius_km: f64) -> Self {
        Self { radius_km }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Closest non-placeholder district, accepted if it lies within the
    /// radius. Ties keep the first district in catalog order.
    pub fn resolve(
        &self,
        latitude: f64,
        longitude: f64,
        catalog: &LocationCatalog,
    ) -> Result<NearestDistrict, Unresolved> {
        let mut best: Option<(&str, &District, f64)> = None;

        for province in catalog.provinces() {
            for district in &province.districts {
                if district.is_placeholder() {
                    continue;
                }
                let distance = haversine_km(latitude, longitude, district.lat, district.lon);
                if best.map_or(true, |(_, _, min)| distance < min) {
                    best = Some((province.name.as_str(), district, distance));
                }
            }
        }

        match best {
            Some((province, district, distance_km)) if distance_km <= self.radius_km => {
                tracing::debug!(
                    "Resolved {:.4},{:.4} to {} / {} ({:.1} km)",
                    latitude,
                    longitude,
                    province,
                    district.name,
                    distance_km
                );
                Ok(NearestDistrict {
                    province: province.to_string(),
                    district: district.clone(),
                    distance_km,
                })
            }
            Some((_, _, distance_km)) => {
                tracing::info!(
                    "No district within {} km (closest {:.1} km)",
                    self.radius_km,
                    distance_km
                );
                Err(Unresolved {
                    min_distance_km: Some(distance_km),
                })
            }
            None => Err(Unresolved {
                min_distance_km: None,
            }),
        }
    }
}

/// Resolve with the default 75 km acceptance radius.
pub fn resolve(
    latitude: f64,
    longitude: f64,
    catalog: &LocationCatalog,
) -> Result<NearestDistrict, Unresolved> {
    NearestLocationResolver::default().resolve(latitude, longitude, catalog)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::catalog::Province;

    fn district(name: &str, lat: f64, lon: f64) -> District {
        District {
            name: name.to_string(),
            lat,
            lon,
        }
    }

    fn catalog(provinces: Vec<(&str, Vec<District>)>) -> LocationCatalog {
        LocationCatalog::new(
            provinces
                .into_iter()
                .map(|(name, districts)| Province {
                    name: name.to_string(),
                    districts,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_haversine_known_distance() {
        // İstanbul (Fatih) to Ankara (Çankaya) is roughly 350 km.
        let d = haversine_km(41.0186, 28.9397, 39.918, 32.863);
        assert!((340.0..360.0).contains(&d), "got {d}");
        assert_eq!(haversine_km(40.99, 29.03, 40.99, 29.03), 0.0);
    }

    #[test]
    fn test_exact_coordinate_resolves_with_zero_distance() {
        let catalog = LocationCatalog::bundled().unwrap();
        let kadikoy = catalog.find_district("İstanbul", "Kadıköy").unwrap().clone();

        let found = resolve(kadikoy.lat, kadikoy.lon, &catalog).unwrap();
        assert_eq!(found.province, "İstanbul");
        assert_eq!(found.district.name, "Kadıköy");
        assert_eq!(found.distance_km, 0.0);
    }

    #[test]
    fn test_point_far_from_everything_is_unresolved() {
        let catalog = catalog(vec![(
            "Ankara",
            vec![district("Çankaya", 39.918, 32.863)],
        )]);

        // About 200 km due north of Çankaya.
        let err = resolve(41.72, 32.863, &catalog).unwrap_err();
        let min = err.min_distance_km.unwrap();
        assert!((195.0..205.0).contains(&min), "got {min}");
    }

    #[test]
    fn test_acceptance_radius_is_inclusive_of_nearby() {
        let catalog = catalog(vec![(
            "İzmir",
            vec![district("Konak", 38.4189, 27.1287)],
        )]);

        // Roughly 55 km east of Konak.
        assert!(resolve(38.4189, 27.76, &catalog).is_ok());
        assert!(NearestLocationResolver::with_radius(50.0)
            .resolve(38.4189, 27.76, &catalog)
            .is_err());
    }

    #[test]
    fn test_placeholders_are_skipped() {
        let catalog = catalog(vec![(
            "Van",
            vec![district("Bilinmeyen", 0.0, 0.0), district("Tuşba", 38.527, 43.39)],
        )]);

        let found = resolve(0.0, 0.0, &catalog);
        assert!(found.is_err());

        let found = resolve(38.527, 43.39, &catalog).unwrap();
        assert_eq!(found.district.name, "Tuşba");
    }

    #[test]
    fn test_only_placeholders_has_no_distance() {
        let catalog = catalog(vec![("Van", vec![district("Bilinmeyen", 0.0, 0.0)])]);
        assert_eq!(
            resolve(38.5, 43.4, &catalog),
            Err(Unresolved {
                min_distance_km: None
            })
        );
        assert_eq!(
            resolve(38.5, 43.4, &LocationCatalog::default()),
            Err(Unresolved {
                min_distance_km: None
            })
        );
    }

    #[test]
    fn test_tie_keeps_first_in_catalog_order() {
        let catalog = catalog(vec![
            ("Kars", vec![district("Merkez", 40.60, 43.09)]),
            ("Ardahan", vec![district("Merkez", 40.60, 43.09)]),
        ]);

        let found = resolve(40.60, 43.09, &catalog).unwrap();
        assert_eq!(found.province, "Kars");
    }
}
