use hava_core::AppError;

use crate::persisted::StoreError;

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(db) => AppError::Database(db),
            StoreError::Serialize(err) => {
                AppError::Other(anyhow::Error::from(err).context("Failed to encode stored value"))
            }
        }
    }
}
