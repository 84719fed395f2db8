//! Error types for the core crate

use thiserror::Error;

/// A domain validation failure.
///
/// Carries the aggregate human-readable message: one entry per violated
/// field path, comma-joined (e.g. `name must not be null, enabled must not
/// be null`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);
