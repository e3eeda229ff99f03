//! Alert subscription form validation.
//!
//! Problems come back as field-level messages for the form to display; they
//! are a normal outcome, not an error to propagate.

use hava_places::LocationCatalog;
use serde::{Deserialize, Serialize};

use crate::favorites::FavoriteLocation;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionForm {
    pub name: String,
    pub email: String,
    pub province: String,
    pub district: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Province,
    District,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl SubscriptionForm {
    /// Check every field. A valid form yields the favorite to monitor, with
    /// names and coordinates taken from the catalog.
    pub fn validate(&self, catalog: &LocationCatalog) -> Result<FavoriteLocation, Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new(Field::Name, "Name is required"));
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FieldError::new(Field::Email, "Email is required"));
        } else if !is_valid_email(email) {
            errors.push(FieldError::new(Field::Email, "Enter a valid email address"));
        }

        let province = self.province.trim();
        let mut district = None;
        if province.is_empty() {
            errors.push(FieldError::new(Field::Province, "Select a province"));
        } else if catalog.list_districts(province).is_empty() {
            errors.push(FieldError::new(
                Field::Province,
                format!("Unknown province '{}'", province),
            ));
        } else if self.district.trim().is_empty() {
            errors.push(FieldError::new(Field::District, "Select a district"));
        } else {
            district = catalog.find_district(province, self.district.trim());
            if district.is_none() {
                errors.push(FieldError::new(
                    Field::District,
                    format!("'{}' is not a district of {}", self.district.trim(), province),
                ));
            }
        }

        match district {
            Some(d) if errors.is_empty() => {
                Ok(FavoriteLocation::new(province, d.name.clone(), d.lat, d.lon))
            }
            _ => Err(errors),
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}
