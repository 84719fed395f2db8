//! Structural and domain validation
//!
//! Field violations are collected into one [`ValidationError`] whose message
//! joins `<field path> <message>` entries with ", ".

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::ValidationError;
use crate::models::{Header, HeaderType};

/// The literal value domain of a static header.
pub const STATIC_TRUE: &str = "True";
pub const STATIC_FALSE: &str = "False";

/// Accumulates field-level violations.
#[derive(Debug, Default)]
pub struct Violations {
    entries: Vec<String>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: &str, message: &str) {
        self.entries.push(format!("{path} {message}"));
    }

    /// Record a violation when the value is absent, passing it through
    /// otherwise.
    pub fn require<T>(&mut self, value: Option<T>, path: &str) -> Option<T> {
        if value.is_none() {
            self.add(path, "must not be null");
        }
        value
    }

    /// Like [`Violations::require`], additionally rejecting blank strings.
    pub fn require_text(&mut self, value: Option<String>, path: &str) -> Option<String> {
        match value {
            Some(text) if !text.trim().is_empty() => Some(text),
            Some(_) => {
                self.add(path, "must not be blank");
                None
            }
            None => {
                self.add(path, "must not be null");
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.entries.is_empty() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }

    pub fn into_error(self) -> ValidationError {
        if self.entries.is_empty() {
            ValidationError("invalid payload".to_owned())
        } else {
            ValidationError(self.entries.join(", "))
        }
    }
}

/// Rejects lists with duplicated items, where identity is given by `key`.
pub fn validate_list<T, K, F>(items: &[T], label: &str, key: F) -> Result<(), ValidationError>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(key(item)) {
            return Err(ValidationError(format!(
                "{label} must not include duplicated items"
            )));
        }
    }
    Ok(())
}

/// A static header must carry the literal `"True"` or `"False"`.
pub fn validate_header(header: &Header) -> Result<(), ValidationError> {
    if header.header_type == HeaderType::Static
        && header.value != STATIC_TRUE
        && header.value != STATIC_FALSE
    {
        return Err(ValidationError(format!(
            "Header value {} must be {} or {} for static type header",
            header.value, STATIC_TRUE, STATIC_FALSE
        )));
    }
    Ok(())
}
