//! The document-store interface
//!
//! One generic trait instead of a trait per entity: every configuration
//! document implements `Document`, and a backend implements
//! `DocumentStore<T>` for all of them at once.

use async_trait::async_trait;
use header_hub_core::{Document, PageRequest, SearchResult};

use crate::StorageError;

/// Persistence operations for one document type.
///
/// `insert` and `update` enforce the document's unique index, converting a
/// conflicting write into [`StorageError::Duplicate`] naming the index.
/// `find` applies the criteria's predicates (find by example) and returns
/// records ordered by `(created_at, id)` so results are deterministic.
#[async_trait]
pub trait DocumentStore<T: Document>: Send + Sync {
    /// Persist a new document.
    async fn insert(&self, document: T) -> Result<T, StorageError>;

    /// Overwrite an existing document; fails if the id is unknown.
    async fn update(&self, document: T) -> Result<T, StorageError>;

    /// Fetch a document by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<T>, StorageError>;

    /// Remove a document by id; fails if the id is unknown.
    async fn delete(&self, id: &str) -> Result<(), StorageError>;

    /// Find documents matching the criteria, optionally paged. `total`
    /// counts all matches before paging.
    async fn find(
        &self,
        criteria: &T::Criteria,
        page: Option<PageRequest>,
    ) -> Result<SearchResult<T>, StorageError>;
}
