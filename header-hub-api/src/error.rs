//! API error types and translation to HTTP responses
//!
//! The one place status codes are assigned. Every error body has the same
//! shape: `{"message": "<text>"}`. Unexpected errors collapse to a generic
//! message; the detail is logged, never leaked.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use header_hub_core::ValidationError;
use header_hub_directory::DirectoryError;
use header_hub_evaluator::EvaluateError;
use header_hub_service::ServiceError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.0)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(inner) => ApiError::Validation(inner.0),
            ServiceError::NotFound(message) => ApiError::NotFound(message),
            ServiceError::Duplicate { index } => ApiError::Duplicate(format!(
                "A document already exists with the same {index} key"
            )),
            ServiceError::Storage(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<EvaluateError> for ApiError {
    fn from(err: EvaluateError) -> Self {
        match err {
            EvaluateError::Validation(message) => ApiError::Validation(message),
            EvaluateError::NotFound(message) => ApiError::NotFound(message),
            EvaluateError::Service(inner) => inner.into(),
            EvaluateError::Directory(inner) => inner.into(),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) | ApiError::Duplicate(message) => {
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Authentication(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::Authorization(message) => (StatusCode::FORBIDDEN, message),
            ApiError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_owned(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
