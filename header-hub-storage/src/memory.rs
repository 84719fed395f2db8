//! In-memory storage implementation for development and testing
//!
//! Documents are kept as JSON values keyed by `Type::id`, the same keying
//! scheme the Couchbase backend uses. Unique-index checks run under the
//! write lock, so a racing duplicate write surfaces as a duplicate-key
//! error, never as two conflicting documents.

use async_trait::async_trait;
use header_hub_core::{Criteria, Document, PageRequest, SearchResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::{DocumentStore, StorageError};

/// In-memory document store for development and testing.
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn key<T: Document>(id: &str) -> String {
        format!("{}::{}", T::TYPE_NAME, id)
    }

    fn prefix<T: Document>() -> String {
        format!("{}::", T::TYPE_NAME)
    }

    /// Scan the documents of `T` for another holder of the same unique key.
    fn check_unique<T: Document>(
        documents: &HashMap<String, Value>,
        document: &T,
    ) -> Result<(), StorageError> {
        let Some(unique_key) = document.unique_key() else {
            return Ok(());
        };
        let prefix = Self::prefix::<T>();
        for (key, value) in documents.iter() {
            if !key.starts_with(&prefix) {
                continue;
            }
            let candidate: T = serde_json::from_value(value.clone())?;
            if candidate.id() == document.id() {
                continue;
            }
            if candidate.unique_key() == Some(unique_key.clone()) {
                return Err(StorageError::Duplicate {
                    index: unique_key.index.to_owned(),
                });
            }
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Document> DocumentStore<T> for MemoryStore {
    async fn insert(&self, document: T) -> Result<T, StorageError> {
        let mut documents = self.documents.write().unwrap();
        Self::check_unique(&documents, &document)?;

        let key = Self::key::<T>(document.id());
        if documents.contains_key(&key) {
            return Err(StorageError::Duplicate {
                index: "id".to_owned(),
            });
        }
        documents.insert(key, serde_json::to_value(&document)?);
        Ok(document)
    }

    async fn update(&self, document: T) -> Result<T, StorageError> {
        let mut documents = self.documents.write().unwrap();
        let key = Self::key::<T>(document.id());
        if !documents.contains_key(&key) {
            return Err(StorageError::NotFound(format!(
                "{} with id {} not found",
                T::TYPE_NAME,
                document.id()
            )));
        }
        Self::check_unique(&documents, &document)?;
        documents.insert(key, serde_json::to_value(&document)?);
        Ok(document)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, StorageError> {
        let documents = self.documents.read().unwrap();
        match documents.get(&Self::key::<T>(id)) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let mut documents = self.documents.write().unwrap();
        if documents.remove(&Self::key::<T>(id)).is_some() {
            Ok(())
        } else {
            Err(StorageError::NotFound(format!(
                "{} with id {} not found",
                T::TYPE_NAME,
                id
            )))
        }
    }

    async fn find(
        &self,
        criteria: &T::Criteria,
        page: Option<PageRequest>,
    ) -> Result<SearchResult<T>, StorageError> {
        let documents = self.documents.read().unwrap();
        let prefix = Self::prefix::<T>();
        let predicates = criteria.predicates();

        let mut matches: Vec<T> = Vec::new();
        for (key, value) in documents.iter() {
            if !key.starts_with(&prefix) {
                continue;
            }
            if predicates.iter().all(|predicate| predicate.matches(value)) {
                matches.push(serde_json::from_value(value.clone())?);
            }
        }
        matches.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });

        let total = matches.len() as u64;
        let records = match page {
            Some(page) => matches
                .into_iter()
                .skip((page.page * page.size) as usize)
                .take(page.size as usize)
                .collect(),
            None => matches,
        };

        Ok(SearchResult { total, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use header_hub_core::{
        Header, HeaderType, ModuleRecord, PolicyRecord, PolicySearchCriteria, System,
        SystemSearchCriteria,
    };

    #[tokio::test]
    async fn insert_and_find_by_id() {
        let store = MemoryStore::new();
        let system = System::new("gateway".into(), Some("edge gateway".into()));

        let saved = store.insert(system.clone()).await.unwrap();
        assert_eq!(saved.name, "gateway");

        let fetched: Option<System> = store.find_by_id(&saved.id).await.unwrap();
        assert_eq!(fetched.unwrap().id, saved.id);
    }

    #[tokio::test]
    async fn duplicate_unique_key_is_rejected() {
        let store = MemoryStore::new();
        store
            .insert(System::new("gateway".into(), None))
            .await
            .unwrap();

        let err = store
            .insert(System::new("gateway".into(), Some("other".into())))
            .await
            .unwrap_err();
        match err {
            StorageError::Duplicate { index } => assert_eq!(index, "name"),
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn same_module_name_under_different_systems_is_allowed() {
        let store = MemoryStore::new();
        store
            .insert(ModuleRecord::new("billing".into(), None, "sys-1".into()))
            .await
            .unwrap();
        store
            .insert(ModuleRecord::new("billing".into(), None, "sys-2".into()))
            .await
            .unwrap();

        let err = store
            .insert(ModuleRecord::new("billing".into(), None, "sys-1".into()))
            .await
            .unwrap_err();
        match err {
            StorageError::Duplicate { index } => assert_eq!(index, "name_system"),
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_keeps_unique_check_but_allows_self() {
        let store = MemoryStore::new();
        let mut header = store
            .insert(Header::new(
                HeaderType::Static,
                "x-flag".into(),
                None,
                "True".into(),
            ))
            .await
            .unwrap();

        // Re-saving the same document under its own name is fine.
        header.value = "False".into();
        store.update(header.clone()).await.unwrap();

        // Renaming onto another header's name is not.
        store
            .insert(Header::new(
                HeaderType::Static,
                "x-other".into(),
                None,
                "True".into(),
            ))
            .await
            .unwrap();
        header.header_name = "x-other".into();
        let err = store.update(header).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(System::new("ghost".into(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn find_matches_substring_and_equality() {
        let store = MemoryStore::new();
        for name in ["edge-gateway", "api-gateway", "ledger"] {
            store.insert(System::new(name.into(), None)).await.unwrap();
        }

        let criteria = SystemSearchCriteria {
            name: Some("gateway".into()),
        };
        let result: SearchResult<System> = store.find(&criteria, None).await.unwrap();
        assert_eq!(result.total, 2);

        let all: SearchResult<System> =
            store.find(&SystemSearchCriteria::default(), None).await.unwrap();
        assert_eq!(all.total, 3);
    }

    #[tokio::test]
    async fn find_filters_policies_by_enabled_and_module() {
        let store = MemoryStore::new();
        store
            .insert(PolicyRecord::new(
                "p1".into(),
                None,
                true,
                vec![],
                "mod-1".into(),
            ))
            .await
            .unwrap();
        store
            .insert(PolicyRecord::new(
                "p2".into(),
                None,
                false,
                vec![],
                "mod-1".into(),
            ))
            .await
            .unwrap();
        store
            .insert(PolicyRecord::new(
                "p3".into(),
                None,
                true,
                vec![],
                "mod-2".into(),
            ))
            .await
            .unwrap();

        let criteria = PolicySearchCriteria {
            enabled: Some(true),
            module_id: Some("mod-1".into()),
            ..Default::default()
        };
        let result: SearchResult<PolicyRecord> = store.find(&criteria, None).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.records[0].name, "p1");
    }

    #[tokio::test]
    async fn paging_slices_but_reports_full_total() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert(System::new(format!("sys-{i}"), None))
                .await
                .unwrap();
        }

        let page = PageRequest { page: 1, size: 2 };
        let result: SearchResult<System> = store
            .find(&SystemSearchCriteria::default(), Some(page))
            .await
            .unwrap();
        assert_eq!(result.total, 5);
        assert_eq!(result.records.len(), 2);
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let store = MemoryStore::new();
        let system = store.insert(System::new("gone".into(), None)).await.unwrap();

        DocumentStore::<System>::delete(&store, &system.id).await.unwrap();
        let fetched: Option<System> = store.find_by_id(&system.id).await.unwrap();
        assert!(fetched.is_none());

        let err = DocumentStore::<System>::delete(&store, &system.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
