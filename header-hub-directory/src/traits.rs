//! The directory service interface

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DirectorySettings;
use crate::error::DirectoryError;

/// A directory attribute value: single- or multi-valued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Single(String),
    Multi(Vec<String>),
}

/// Read-side directory operations consumed by the engine.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Check a username/password pair against the directory.
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<bool, DirectoryError>;

    /// Resolve a username to its DN. `None` when there is no unambiguous
    /// match.
    async fn find_user_dn(&self, username: &str) -> Result<Option<String>, DirectoryError>;

    /// List the usernames known to the directory.
    async fn list_users(&self) -> Result<Vec<String>, DirectoryError>;

    /// Evaluate a rule expression (`name=value` pairs joined by commas) as
    /// an existence predicate.
    async fn evaluate_rule(&self, rule: &str) -> Result<bool, DirectoryError>;

    /// Fetch the requested attributes of a user entry in one round trip.
    ///
    /// Every requested attribute name is present as a key in the returned
    /// map; attributes absent from the entry map to `None`.
    async fn get_user_attributes(
        &self,
        user_dn: &str,
        attributes: &[String],
    ) -> Result<HashMap<String, Option<AttributeValue>>, DirectoryError>;
}

/// Builds a connected [`DirectoryService`] from settings. The engine goes
/// through a provider so the directory in effect always follows the latest
/// enabled configuration.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    async fn open(
        &self,
        settings: &DirectorySettings,
    ) -> Result<Arc<dyn DirectoryService>, DirectoryError>;
}
