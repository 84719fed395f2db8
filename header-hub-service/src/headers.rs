//! Header operations

use std::sync::Arc;

use header_hub_core::{
    Header, HeaderInput, HeaderSearchCriteria, NestedDoc, PageRequest, SearchResult,
};
use header_hub_storage::DocumentStore;

use crate::{AuditLogger, DocumentEngine, ServiceError};

pub struct HeaderService {
    engine: DocumentEngine<Header>,
}

impl HeaderService {
    pub fn new(store: Arc<dyn DocumentStore<Header>>, audit: AuditLogger) -> Self {
        Self {
            engine: DocumentEngine::new(store, audit),
        }
    }

    pub async fn create(&self, input: HeaderInput, actor: &str) -> Result<Header, ServiceError> {
        let header = input.validate()?;
        self.engine.create(header, actor).await
    }

    pub async fn update(
        &self,
        id: &str,
        input: HeaderInput,
        actor: &str,
    ) -> Result<Header, ServiceError> {
        let header = input.validate()?;
        self.engine.update(id, header, actor).await
    }

    pub async fn get(&self, id: &str) -> Result<Header, ServiceError> {
        self.engine.get(id).await
    }

    pub async fn find(&self, id: &str) -> Result<Option<Header>, ServiceError> {
        self.engine.find(id).await
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<(), ServiceError> {
        self.engine.delete(id, actor).await
    }

    pub async fn search(
        &self,
        criteria: &HeaderSearchCriteria,
        page: Option<PageRequest>,
    ) -> Result<SearchResult<Header>, ServiceError> {
        self.engine.search(criteria, page).await
    }

    /// Create-or-update-or-link a nested header position.
    pub async fn resolve(
        &self,
        nested: NestedDoc<HeaderInput>,
        actor: &str,
    ) -> Result<Header, ServiceError> {
        match nested {
            NestedDoc::Reference(doc_ref) => self.engine.get(&doc_ref.id).await,
            NestedDoc::Inline(input) => match input.id.clone() {
                Some(id) => self.update(&id, input, actor).await,
                None => self.create(input, actor).await,
            },
        }
    }
}
