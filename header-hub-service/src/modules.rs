//! Module operations
//!
//! A module owns a reference to its system; the system position in a module
//! payload resolves before the module itself is persisted.

use std::sync::Arc;

use header_hub_core::{
    Module, ModuleInput, ModuleRecord, ModuleSearchCriteria, NestedDoc, PageRequest, SearchResult,
};
use header_hub_storage::DocumentStore;

use crate::{AuditLogger, DocumentEngine, ServiceError, SystemService};

pub struct ModuleService {
    engine: DocumentEngine<ModuleRecord>,
    systems: Arc<SystemService>,
}

impl ModuleService {
    pub fn new(
        store: Arc<dyn DocumentStore<ModuleRecord>>,
        audit: AuditLogger,
        systems: Arc<SystemService>,
    ) -> Self {
        Self {
            engine: DocumentEngine::new(store, audit),
            systems,
        }
    }

    pub async fn create(&self, input: ModuleInput, actor: &str) -> Result<Module, ServiceError> {
        let parts = input.validate()?;
        let system = self.systems.resolve(parts.system, actor).await?;
        let record = ModuleRecord::new(parts.name, parts.description, system.id.clone());
        let created = self.engine.create(record, actor).await?;
        Ok(Module::from_record(created, Some(system)))
    }

    pub async fn update(
        &self,
        id: &str,
        input: ModuleInput,
        actor: &str,
    ) -> Result<Module, ServiceError> {
        let parts = input.validate()?;
        let system = self.systems.resolve(parts.system, actor).await?;
        let record = ModuleRecord::new(parts.name, parts.description, system.id.clone());
        let updated = self.engine.update(id, record, actor).await?;
        Ok(Module::from_record(updated, Some(system)))
    }

    pub async fn get(&self, id: &str) -> Result<Module, ServiceError> {
        let record = self.engine.get(id).await?;
        self.hydrate(record).await
    }

    pub async fn find(&self, id: &str) -> Result<Option<Module>, ServiceError> {
        match self.engine.find(id).await? {
            Some(record) => Ok(Some(self.hydrate(record).await?)),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<(), ServiceError> {
        self.engine.delete(id, actor).await
    }

    pub async fn search(
        &self,
        criteria: &ModuleSearchCriteria,
        page: Option<PageRequest>,
    ) -> Result<SearchResult<Module>, ServiceError> {
        let found = self.engine.search(criteria, page).await?;
        let mut records = Vec::with_capacity(found.records.len());
        for record in found.records {
            records.push(self.hydrate(record).await?);
        }
        Ok(SearchResult {
            total: found.total,
            records,
        })
    }

    /// Create-or-update-or-link a nested module position.
    pub async fn resolve(
        &self,
        nested: NestedDoc<ModuleInput>,
        actor: &str,
    ) -> Result<Module, ServiceError> {
        match nested {
            NestedDoc::Reference(doc_ref) => {
                let record = self.engine.get(&doc_ref.id).await?;
                self.hydrate(record).await
            }
            NestedDoc::Inline(input) => match input.id.clone() {
                Some(id) => self.update(&id, input, actor).await,
                None => self.create(input, actor).await,
            },
        }
    }

    async fn hydrate(&self, record: ModuleRecord) -> Result<Module, ServiceError> {
        let system = self.systems.find(&record.system_id).await?;
        Ok(Module::from_record(record, system))
    }
}
