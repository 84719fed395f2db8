//! System operations

use std::sync::Arc;

use header_hub_core::{
    NestedDoc, PageRequest, SearchResult, System, SystemInput, SystemSearchCriteria,
};
use header_hub_storage::DocumentStore;

use crate::{AuditLogger, DocumentEngine, ServiceError};

pub struct SystemService {
    engine: DocumentEngine<System>,
}

impl SystemService {
    pub fn new(store: Arc<dyn DocumentStore<System>>, audit: AuditLogger) -> Self {
        Self {
            engine: DocumentEngine::new(store, audit),
        }
    }

    pub async fn create(&self, input: SystemInput, actor: &str) -> Result<System, ServiceError> {
        let system = input.validate()?;
        self.engine.create(system, actor).await
    }

    pub async fn update(
        &self,
        id: &str,
        input: SystemInput,
        actor: &str,
    ) -> Result<System, ServiceError> {
        let system = input.validate()?;
        self.engine.update(id, system, actor).await
    }

    pub async fn get(&self, id: &str) -> Result<System, ServiceError> {
        self.engine.get(id).await
    }

    pub async fn find(&self, id: &str) -> Result<Option<System>, ServiceError> {
        self.engine.find(id).await
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<(), ServiceError> {
        self.engine.delete(id, actor).await
    }

    pub async fn search(
        &self,
        criteria: &SystemSearchCriteria,
        page: Option<PageRequest>,
    ) -> Result<SearchResult<System>, ServiceError> {
        self.engine.search(criteria, page).await
    }

    /// Create-or-update-or-link a nested system position.
    pub async fn resolve(
        &self,
        nested: NestedDoc<SystemInput>,
        actor: &str,
    ) -> Result<System, ServiceError> {
        match nested {
            NestedDoc::Reference(doc_ref) => self.engine.get(&doc_ref.id).await,
            NestedDoc::Inline(input) => match input.id.clone() {
                Some(id) => self.update(&id, input, actor).await,
                None => self.create(input, actor).await,
            },
        }
    }
}
