//! In-memory directory for development and testing
//!
//! Holds username → entry mappings and evaluates rule expressions against
//! the entries' attributes: `uid=alice,ou=eng` matches when some entry has
//! every named attribute value.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::DirectorySettings;
use crate::error::DirectoryError;
use crate::traits::{AttributeValue, DirectoryProvider, DirectoryService};

/// One directory entry.
#[derive(Debug, Clone, Default)]
pub struct DirectoryEntry {
    pub dn: String,
    pub password: String,
    pub attributes: HashMap<String, Vec<String>>,
}

/// In-memory directory keyed by username.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<String, DirectoryEntry>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, username: &str, dn: &str, password: &str) {
        let mut users = self.users.write().unwrap();
        users.insert(
            username.to_owned(),
            DirectoryEntry {
                dn: dn.to_owned(),
                password: password.to_owned(),
                attributes: HashMap::new(),
            },
        );
    }

    pub fn set_attribute(&self, username: &str, name: &str, values: Vec<String>) {
        let mut users = self.users.write().unwrap();
        if let Some(entry) = users.get_mut(username) {
            entry.attributes.insert(name.to_owned(), values);
        }
    }

    fn entry_matches(entry: &DirectoryEntry, pairs: &[(String, String)]) -> bool {
        pairs.iter().all(|(name, value)| {
            entry
                .attributes
                .get(name)
                .is_some_and(|values| values.iter().any(|candidate| candidate == value))
        })
    }
}

#[async_trait]
impl DirectoryService for InMemoryDirectory {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, DirectoryError> {
        let users = self.users.read().unwrap();
        Ok(users
            .get(username)
            .is_some_and(|entry| entry.password == password))
    }

    async fn find_user_dn(&self, username: &str) -> Result<Option<String>, DirectoryError> {
        let users = self.users.read().unwrap();
        Ok(users.get(username).map(|entry| entry.dn.clone()))
    }

    async fn list_users(&self) -> Result<Vec<String>, DirectoryError> {
        let users = self.users.read().unwrap();
        let mut names: Vec<String> = users.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn evaluate_rule(&self, rule: &str) -> Result<bool, DirectoryError> {
        let mut pairs = Vec::new();
        for clause in rule.split(',') {
            match clause.split_once('=') {
                Some((name, value)) => {
                    pairs.push((name.trim().to_owned(), value.trim().to_owned()))
                }
                None => return Ok(false),
            }
        }

        let users = self.users.read().unwrap();
        Ok(users
            .values()
            .any(|entry| Self::entry_matches(entry, &pairs)))
    }

    async fn get_user_attributes(
        &self,
        user_dn: &str,
        attributes: &[String],
    ) -> Result<HashMap<String, Option<AttributeValue>>, DirectoryError> {
        let users = self.users.read().unwrap();
        let entry_attrs = users
            .values()
            .find(|entry| entry.dn == user_dn)
            .map(|entry| entry.attributes.clone())
            .unwrap_or_default();

        let mut result = HashMap::new();
        for name in attributes {
            let value = match entry_attrs.get(name) {
                Some(values) if values.len() > 1 => Some(AttributeValue::Multi(values.clone())),
                Some(values) if values.len() == 1 => {
                    Some(AttributeValue::Single(values[0].clone()))
                }
                _ => None,
            };
            result.insert(name.clone(), value);
        }
        Ok(result)
    }
}

/// Hands out one fixed directory regardless of settings. For tests and
/// development without an LDAP server.
pub struct StaticDirectoryProvider {
    directory: Arc<dyn DirectoryService>,
}

impl StaticDirectoryProvider {
    pub fn new(directory: Arc<dyn DirectoryService>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl DirectoryProvider for StaticDirectoryProvider {
    async fn open(
        &self,
        _settings: &DirectorySettings,
    ) -> Result<Arc<dyn DirectoryService>, DirectoryError> {
        Ok(self.directory.clone())
    }
}
