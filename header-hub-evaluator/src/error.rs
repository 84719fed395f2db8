//! Evaluation error types

use header_hub_directory::DirectoryError;
use header_hub_service::ServiceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvaluateError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
