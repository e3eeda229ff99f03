use hava_core::{AppError, Capability};
use hava_services::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Notification permission denied")]
    PermissionDenied,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AlertError> for AppError {
    fn from(e: AlertError) -> Self {
        match e {
            AlertError::PermissionDenied => AppError::PermissionDenied(Capability::Notifications),
            AlertError::Store(e) => e.into(),
        }
    }
}
