//! LDAP configuration operations
//!
//! The directory in effect is parameterized by the latest-modified enabled
//! configuration document.

use std::sync::Arc;

use header_hub_core::{
    LdapConfiguration, LdapConfigurationInput, LdapConfigurationSearchCriteria, PageRequest,
    SearchResult,
};
use header_hub_storage::DocumentStore;

use crate::{AuditLogger, DocumentEngine, ServiceError};

pub struct LdapConfigurationService {
    engine: DocumentEngine<LdapConfiguration>,
}

impl LdapConfigurationService {
    pub fn new(store: Arc<dyn DocumentStore<LdapConfiguration>>, audit: AuditLogger) -> Self {
        Self {
            engine: DocumentEngine::new(store, audit),
        }
    }

    pub async fn create(
        &self,
        input: LdapConfigurationInput,
        actor: &str,
    ) -> Result<LdapConfiguration, ServiceError> {
        let configuration = input.validate()?;
        self.engine.create(configuration, actor).await
    }

    pub async fn update(
        &self,
        id: &str,
        input: LdapConfigurationInput,
        actor: &str,
    ) -> Result<LdapConfiguration, ServiceError> {
        let configuration = input.validate()?;
        self.engine.update(id, configuration, actor).await
    }

    pub async fn get(&self, id: &str) -> Result<LdapConfiguration, ServiceError> {
        self.engine.get(id).await
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<(), ServiceError> {
        self.engine.delete(id, actor).await
    }

    pub async fn search(
        &self,
        criteria: &LdapConfigurationSearchCriteria,
        page: Option<PageRequest>,
    ) -> Result<SearchResult<LdapConfiguration>, ServiceError> {
        self.engine.search(criteria, page).await
    }

    /// The enabled configuration with the newest modification time.
    pub async fn latest_enabled(&self) -> Result<LdapConfiguration, ServiceError> {
        let criteria = LdapConfigurationSearchCriteria {
            enabled: Some(true),
            ..Default::default()
        };
        let found = self.engine.search(&criteria, None).await?;
        found
            .records
            .into_iter()
            .max_by_key(|configuration| configuration.last_modified_at)
            .ok_or_else(|| {
                ServiceError::NotFound("There is no enabled ldap configuration".to_owned())
            })
    }
}
