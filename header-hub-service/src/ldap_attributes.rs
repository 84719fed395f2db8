//! LDAP attribute catalog

use std::sync::Arc;

use header_hub_core::{LdapAttribute, LdapAttributeSearchCriteria, SearchResult};
use header_hub_storage::DocumentStore;

use crate::ServiceError;

pub struct LdapAttributeService {
    store: Arc<dyn DocumentStore<LdapAttribute>>,
}

impl LdapAttributeService {
    pub fn new(store: Arc<dyn DocumentStore<LdapAttribute>>) -> Self {
        Self { store }
    }

    /// Names of all enabled attributes.
    pub async fn enabled_names(&self) -> Result<Vec<String>, ServiceError> {
        let criteria = LdapAttributeSearchCriteria {
            enabled: Some(true),
            ..Default::default()
        };
        let found: SearchResult<LdapAttribute> = self.store.find(&criteria, None).await?;
        Ok(found
            .records
            .into_iter()
            .map(|attribute| attribute.name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use header_hub_storage::MemoryStore;

    #[tokio::test]
    async fn lists_only_enabled_attribute_names() {
        let store = Arc::new(MemoryStore::new());
        for (name, enabled) in [("uid", true), ("mail", false), ("department", true)] {
            store
                .insert(LdapAttribute::new(name.to_owned(), enabled))
                .await
                .unwrap();
        }

        let service = LdapAttributeService::new(store);
        let names = service.enabled_names().await.unwrap();
        assert_eq!(names, vec!["uid".to_owned(), "department".to_owned()]);
    }
}
