//! Activity log search
//!
//! The audit trail is append-only: this service only reads. Writing happens
//! exclusively through [`crate::AuditLogger`].

use std::sync::Arc;

use header_hub_core::{ActivityLog, ActivityLogSearchCriteria, PageRequest, SearchResult};
use header_hub_storage::DocumentStore;

use crate::ServiceError;

pub struct ActivityLogService {
    store: Arc<dyn DocumentStore<ActivityLog>>,
}

impl ActivityLogService {
    pub fn new(store: Arc<dyn DocumentStore<ActivityLog>>) -> Self {
        Self { store }
    }

    pub async fn search(
        &self,
        criteria: &ActivityLogSearchCriteria,
        page: Option<PageRequest>,
    ) -> Result<SearchResult<ActivityLog>, ServiceError> {
        Ok(self.store.find(criteria, page).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuditLogger, SystemService};
    use header_hub_core::OperationType;
    use header_hub_storage::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn search_filters_by_document_type_and_operation() {
        let store = Arc::new(MemoryStore::new());
        let audit = AuditLogger::new(store.clone());
        let systems = SystemService::new(store.clone(), audit.clone());

        let created = systems
            .create(serde_json::from_value(json!({"name": "portal"})).unwrap(), "alice")
            .await
            .unwrap();
        systems
            .update(
                &created.id,
                serde_json::from_value(json!({"name": "portal-2"})).unwrap(),
                "bob",
            )
            .await
            .unwrap();

        let service = ActivityLogService::new(store);

        let changes = service
            .search(
                &ActivityLogSearchCriteria {
                    operation_type: Some(OperationType::Change),
                    document_type: Some("System".into()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(changes.total, 1);
        assert_eq!(changes.records[0].operated_by, "bob");

        let by_actor = service
            .search(
                &ActivityLogSearchCriteria {
                    operated_by: Some("alice".into()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(by_actor.total, 1);
        assert_eq!(by_actor.records[0].operation_type, OperationType::Create);
    }
}
