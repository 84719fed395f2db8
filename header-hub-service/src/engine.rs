//! The generic document engine
//!
//! Create, update, get, delete and search for any [`Document`] type, with
//! exactly one audit entry per persistence operation. Entity-specific
//! validation and reference resolution happen in the per-entity services
//! before documents reach the engine.

use chrono::Utc;
use std::sync::Arc;

use header_hub_core::{Document, OperationType, PageRequest, SearchResult};
use header_hub_storage::DocumentStore;

use crate::{AuditLogger, ServiceError};

pub struct DocumentEngine<T: Document> {
    store: Arc<dyn DocumentStore<T>>,
    audit: AuditLogger,
}

impl<T: Document> DocumentEngine<T> {
    pub fn new(store: Arc<dyn DocumentStore<T>>, audit: AuditLogger) -> Self {
        Self { store, audit }
    }

    pub async fn create(&self, document: T, actor: &str) -> Result<T, ServiceError> {
        let created = self.store.insert(document).await?;
        self.audit
            .record(OperationType::Create, None, Some(&created), actor)
            .await?;
        tracing::debug!("created {} {}", T::TYPE_NAME, created.id());
        Ok(created)
    }

    /// Overwrite the document with the given id, keeping its creation
    /// timestamp and stamping the modification time.
    pub async fn update(&self, id: &str, mut document: T, actor: &str) -> Result<T, ServiceError> {
        let existing = self.ensure_exists(id).await?;

        document.set_id(id.to_owned());
        document.set_created_at(existing.created_at());
        document.touch(Utc::now());
        let updated = self.store.update(document).await?;

        self.audit
            .record(OperationType::Change, Some(&existing), Some(&updated), actor)
            .await?;
        Ok(updated)
    }

    pub async fn get(&self, id: &str) -> Result<T, ServiceError> {
        self.ensure_exists(id).await
    }

    /// Fetch without the not-found error, for lenient reference hydration.
    pub async fn find(&self, id: &str) -> Result<Option<T>, ServiceError> {
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<(), ServiceError> {
        let existing = self.ensure_exists(id).await?;
        self.store.delete(id).await?;
        self.audit
            .record(OperationType::Delete, Some(&existing), None, actor)
            .await?;
        tracing::debug!("deleted {} {}", T::TYPE_NAME, id);
        Ok(())
    }

    pub async fn search(
        &self,
        criteria: &T::Criteria,
        page: Option<PageRequest>,
    ) -> Result<SearchResult<T>, ServiceError> {
        Ok(self.store.find(criteria, page).await?)
    }

    async fn ensure_exists(&self, id: &str) -> Result<T, ServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Document with ID = {id} does not exist")))
    }
}
