//! LDAP directory implementation
//!
//! One bound service-account connection per directory instance; individual
//! operations clone the cheap `Ldap` handle. Authentication binds on a
//! dedicated short-lived connection so the service bind stays intact.

use async_trait::async_trait;
use ldap3::{ldap_escape, LdapConnAsync, Scope, SearchEntry, SearchOptions, SearchResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::DirectorySettings;
use crate::error::DirectoryError;
use crate::traits::{AttributeValue, DirectoryProvider, DirectoryService};

/// Directory service backed by an LDAP server.
pub struct LdapDirectory {
    settings: DirectorySettings,
    ldap: ldap3::Ldap,
}

impl LdapDirectory {
    /// Connect and bind with the service account.
    pub async fn connect(settings: DirectorySettings) -> Result<Self, DirectoryError> {
        debug!(url = %settings.url, "Connecting to LDAP server");
        let (conn, mut ldap) = LdapConnAsync::new(&settings.url).await.map_err(|e| {
            DirectoryError::Connection(format!(
                "Failed to connect to LDAP server at {}: {}",
                settings.url, e
            ))
        })?;

        // Spawn the connection driver
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let result = ldap.simple_bind(&settings.user_dn, &settings.password).await?;
        if result.rc != 0 {
            return Err(DirectoryError::Bind(format!(
                "bind as {} failed with code {}: {}",
                settings.user_dn, result.rc, result.text
            )));
        }

        info!(url = %settings.url, "LDAP connection established");
        Ok(Self { settings, ldap })
    }

    /// The absolute user subtree base.
    fn user_search_base(&self) -> String {
        if self.settings.user_search_base.is_empty() {
            self.settings.base.clone()
        } else {
            format!("{},{}", self.settings.user_search_base, self.settings.base)
        }
    }

    fn username_filter(&self, username: &str) -> String {
        format!(
            "({}={})",
            self.settings.user_attribute,
            ldap_escape(username)
        )
    }
}

#[async_trait]
impl DirectoryService for LdapDirectory {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, DirectoryError> {
        let Some(dn) = self.find_user_dn(username).await? else {
            return Ok(false);
        };

        let (conn, mut ldap) = LdapConnAsync::new(&self.settings.url).await.map_err(|e| {
            DirectoryError::Connection(format!(
                "Failed to connect to LDAP server at {}: {}",
                self.settings.url, e
            ))
        })?;
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let outcome = ldap.simple_bind(&dn, password).await?;
        let _ = ldap.unbind().await;
        Ok(outcome.rc == 0)
    }

    async fn find_user_dn(&self, username: &str) -> Result<Option<String>, DirectoryError> {
        let mut ldap = self.ldap.clone();
        let SearchResult(entries, _) = ldap
            .search(
                &self.user_search_base(),
                Scope::Subtree,
                &self.username_filter(username),
                vec!["1.1"],
            )
            .await?;

        match entries.len() {
            1 => {
                let entry = SearchEntry::construct(entries.into_iter().next().ok_or_else(
                    || DirectoryError::Connection("search entry vanished".into()),
                )?);
                Ok(Some(entry.dn))
            }
            0 => Ok(None),
            n => {
                warn!(username, matches = n, "ambiguous username match");
                Ok(None)
            }
        }
    }

    async fn list_users(&self) -> Result<Vec<String>, DirectoryError> {
        let attribute = self.settings.user_attribute.clone();
        let mut ldap = self.ldap.clone();
        let SearchResult(entries, _) = ldap
            .search(
                &self.user_search_base(),
                Scope::Subtree,
                &format!("({}=*)", attribute),
                vec![attribute.clone()],
            )
            .await?;

        let users = entries
            .into_iter()
            .map(SearchEntry::construct)
            .filter_map(|entry| {
                entry
                    .attrs
                    .get(&attribute)
                    .and_then(|values| values.first().cloned())
            })
            .collect();
        Ok(users)
    }

    async fn evaluate_rule(&self, rule: &str) -> Result<bool, DirectoryError> {
        // The rule expression is a relative DN under the root context; the
        // rule matches when at least one entry exists below it.
        let base = format!("{},{}", rule, self.settings.base);
        let mut ldap = self.ldap.clone();
        let outcome = ldap
            .with_search_options(SearchOptions::new().sizelimit(1))
            .search(&base, Scope::Subtree, "(objectClass=*)", vec!["1.1"])
            .await;

        match outcome {
            Ok(SearchResult(entries, _)) => Ok(!entries.is_empty()),
            Err(error) => {
                warn!(rule, error = %error, "rule evaluation failed");
                Ok(false)
            }
        }
    }

    async fn get_user_attributes(
        &self,
        user_dn: &str,
        attributes: &[String],
    ) -> Result<HashMap<String, Option<AttributeValue>>, DirectoryError> {
        let mut ldap = self.ldap.clone();
        let SearchResult(entries, _) = ldap
            .search(
                user_dn,
                Scope::Base,
                "(objectClass=*)",
                attributes.to_vec(),
            )
            .await?;

        let entry_attrs = entries
            .into_iter()
            .next()
            .map(SearchEntry::construct)
            .map(|entry| entry.attrs)
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

/// Opens a fresh LDAP connection per request.
pub struct LdapDirectoryProvider;

#[async_trait]
impl DirectoryProvider for LdapDirectoryProvider {
    async fn open(
        &self,
        settings: &DirectorySettings,
    ) -> Result<Arc<dyn DirectoryService>, DirectoryError> {
        let directory = LdapDirectory::connect(settings.clone()).await?;
        Ok(Arc::new(directory))
    }
}
