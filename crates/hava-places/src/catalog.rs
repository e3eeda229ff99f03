//! Static province → district table.
//!
//! Loaded once at startup and never mutated. Province order and district
//! order follow the source dataset.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const BUNDLED_DATASET: &str = include_str!("../data/districts.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate province '{0}'")]
    DuplicateProvince(String),

    #[error("Duplicate district '{district}' in {province}")]
    DuplicateDistrict { province: String, district: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct District {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl District {
    /// Coordinates of (0, 0) mark a district whose position is unknown.
    pub fn is_placeholder(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Province {
    #[serde(rename = "province")]
    pub name: String,
    pub districts: Vec<District>,
}

/// A (province, district) pair returned by [`LocationCatalog::search`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Place<'a> {
    pub province: &'a str,
    pub district: &'a District,
}

#[derive(Debug, Clone, Default)]
pub struct LocationCatalog {
    provinces: Vec<Province>,
}

impl LocationCatalog {
    /// Build a catalog, rejecting duplicate province names and duplicate
    /// district names within a province.
    pub fn new(provinces: Vec<Province>) -> Result<Self, CatalogError> {
        let mut seen_provinces = HashSet::new();
        for province in &provinces {
            if !seen_provinces.insert(province.name.as_str()) {
                return Err(CatalogError::DuplicateProvince(province.name.clone()));
            }
            let mut seen_districts = HashSet::new();
            for district in &province.districts {
                if !seen_districts.insert(fold_case(&district.name)) {
                    return Err(CatalogError::DuplicateDistrict {
                        province: province.name.clone(),
                        district: district.name.clone(),
                    });
                }
            }
        }
        Ok(Self { provinces })
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let provinces: Vec<Province> = serde_json::from_str(raw)?;
        Self::new(provinces)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            "Loaded {} districts in {} provinces from {}",
            catalog.district_count(),
            catalog.provinces.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// The dataset compiled into the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_DATASET)
    }

    pub fn provinces(&self) -> &[Province] {
        &self.provinces
    }

    pub fn list_provinces(&self) -> Vec<&str> {
        self.provinces.iter().map(|p| p.name.as_str()).collect()
    }

    /// Districts of `province` in dataset order; empty if the province is unknown.
    pub fn list_districts(&self, province: &str) -> &[District] {
        self.provinces
            .iter()
            .find(|p| p.name == province)
            .map(|p| p.districts.as_slice())
            .unwrap_or(&[])
    }

    /// Exact match on province, case-insensitive on district.
    pub fn find_district(&self, province: &str, name: &str) -> Option<&District> {
        let wanted = fold_case(name);
        self.list_districts(province)
            .iter()
            .find(|d| fold_case(&d.name) == wanted)
    }

    /// Case-insensitive substring search over "district, province".
    pub fn search(&self, query: &str) -> Vec<Place<'_>> {
        let needle = fold_case(query.trim());
        if needle.is_empty() {
            return Vec::new();
        }

        self.provinces
            .iter()
            .flat_map(|p| {
                p.districts.iter().map(move |d| Place {
                    province: p.name.as_str(),
                    district: d,
                })
            })
            .filter(|place| {
                fold_case(&format!("{}, {}", place.district.name, place.province)).contains(&needle)
            })
            .collect()
    }

    pub fn district_count(&self) -> usize {
        self.provinces.iter().map(|p| p.districts.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.district_count() == 0
    }
}

/// Lowercase for name comparison. Dotted capital İ folds to plain `i`
/// so "İnegöl" and "inegöl" compare equal.
pub fn fold_case(s: &str) -> String {
    s.chars()
        .map(|c| if c == 'İ' { 'I' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}
