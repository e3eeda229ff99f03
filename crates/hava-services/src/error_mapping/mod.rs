//! Conversions from crate-level errors into [`AppError`].
//!
//! Errors owned by this crate get `From` impls. Errors from sibling crates
//! go through [`IntoAppError`] since neither side of the conversion is
//! local here.

mod places;
mod store;
mod weather;

use hava_core::AppError;

pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}
