//! Service error types

use header_hub_core::ValidationError;
use header_hub_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("Duplicate key on index '{index}'")]
    Duplicate { index: String },

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(message) => ServiceError::NotFound(message),
            StorageError::Duplicate { index } => ServiceError::Duplicate { index },
            other => ServiceError::Storage(other),
        }
    }
}
