//! Couchbase storage implementation
//!
//! Documents are stored under `Type::id` keys with a `doc_type` discriminator
//! field, and find-by-example criteria translate to N1QL predicates. Unique
//! indexes are enforced by a query before each write; unlike a native unique
//! index this leaves a small race window between check and write.

use async_trait::async_trait;
use couchbase::{
    cluster::Cluster,
    collection::Collection,
    options::{
        cluster_options::ClusterOptions,
        diagnostic_options::WaitUntilReadyOptions,
        kv_options::{GetOptions, RemoveOptions, UpsertOptions},
        query_options::QueryOptions,
    },
};
use tokio_stream::StreamExt;

use couchbase::authenticator::{Authenticator, PasswordAuthenticator};

use header_hub_core::{Criteria, Document, Matcher, PageRequest, Predicate, SearchResult};
use std::sync::Arc;

use crate::{DocumentStore, StorageError};

/// Couchbase storage configuration
#[derive(Debug, Clone)]
pub struct CouchbaseConfig {
    pub connection_string: String,
    pub username: String,
    pub password: String,
    pub bucket_name: String,
}

impl Default for CouchbaseConfig {
    fn default() -> Self {
        Self {
            connection_string: "couchbase://localhost".to_string(),
            username: "admin".to_string(),
            password: "password123".to_string(),
            bucket_name: "header-hub".to_string(),
        }
    }
}

/// Couchbase store for the configuration documents
pub struct CouchbaseStorage {
    cluster: Arc<Cluster>,
    collection: Collection,
    bucket_name: String,
}

impl CouchbaseStorage {
    /// Create a new Couchbase storage instance
    pub async fn new(config: CouchbaseConfig) -> Result<Self, StorageError> {
        let authenticator = PasswordAuthenticator::new(&config.username, &config.password);
        let options = ClusterOptions::new(Authenticator::PasswordAuthenticator(authenticator));
        let cluster = Cluster::connect(&config.connection_string, options)
            .await
            .map_err(|e| StorageError::Connection(format!("Failed to connect to cluster: {}", e)))?;

        let bucket = cluster.bucket(&config.bucket_name);
        let _: () = bucket
            .wait_until_ready(WaitUntilReadyOptions::default())
            .await
            .map_err(|e: couchbase::error::Error| {
                StorageError::Connection(format!("Failed to connect to bucket: {}", e))
            })?;

        let collection = bucket.default_collection();

        tracing::info!(
            "Connected to Couchbase cluster at {}, bucket: {}",
            config.connection_string,
            config.bucket_name
        );

        Ok(Self {
            cluster: Arc::new(cluster),
            collection,
            bucket_name: config.bucket_name,
        })
    }

    /// Create a new instance with default configuration
    pub async fn with_defaults() -> Result<Self, StorageError> {
        Self::new(CouchbaseConfig::default()).await
    }

    fn doc_key<T: Document>(id: &str) -> String {
        format!("{}::{}", T::TYPE_NAME, id)
    }

    /// Execute a N1QL query
    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        statement: &str,
    ) -> Result<Vec<T>, StorageError> {
        let mut result = self
            .cluster
            .query(statement, QueryOptions::default())
            .await
            .map_err(|e: couchbase::error::Error| {
                StorageError::Internal(format!("Query failed: {}", e))
            })?;

        let mut rows = Vec::new();
        let mut row_iter = result.rows::<T>();

        while let Some(row) = row_iter.next().await {
            match row {
                Ok(r) => rows.push(r),
                Err(e) => {
                    tracing::warn!("Failed to deserialize row: {}", e);
                }
            }
        }

        Ok(rows)
    }

    fn predicate_to_n1ql(predicate: &Predicate) -> String {
        match predicate.matcher {
            Matcher::Equals => format!(
                "t.`{}` = {}",
                predicate.field,
                serde_json::to_string(&predicate.value).unwrap_or_else(|_| "null".into())
            ),
            Matcher::Contains => {
                let needle = predicate
                    .value
                    .as_str()
                    .unwrap_or_default()
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                let pattern = format!("%{}%", needle);
                format!(
                    "t.`{}` LIKE {}",
                    predicate.field,
                    serde_json::to_string(&pattern).unwrap_or_else(|_| "null".into())
                )
            }
        }
    }

    fn where_clause<T: Document>(predicates: &[Predicate]) -> String {
        let mut clauses = vec![format!("t.doc_type = '{}'", T::TYPE_NAME)];
        clauses.extend(predicates.iter().map(Self::predicate_to_n1ql));
        clauses.join(" AND ")
    }

    /// Fail with a duplicate-key error if another document of `T` holds the
    /// same unique key.
    async fn ensure_unique<T: Document>(&self, document: &T) -> Result<(), StorageError> {
        let Some(unique_key) = document.unique_key() else {
            return Ok(());
        };
        let predicates: Vec<Predicate> = unique_key
            .fields
            .iter()
            .map(|(field, value)| Predicate::equals(*field, value.clone()))
            .collect();
        let statement = format!(
            "SELECT RAW t.id FROM `{}` t WHERE {} AND t.id != {} LIMIT 1",
            self.bucket_name,
            Self::where_clause::<T>(&predicates),
            serde_json::to_string(document.id())?,
        );
        let holders: Vec<String> = self.query(&statement).await?;
        if holders.is_empty() {
            Ok(())
        } else {
            Err(StorageError::Duplicate {
                index: unique_key.index.to_owned(),
            })
        }
    }

    async fn upsert<T: Document>(&self, document: T) -> Result<T, StorageError> {
        let key = Self::doc_key::<T>(document.id());
        let mut value = serde_json::to_value(&document)?;
        if let Some(object) = value.as_object_mut() {
            object.insert("doc_type".into(), T::TYPE_NAME.into());
        }
        let _ = self
            .collection
            .upsert(&key, &value, UpsertOptions::default())
            .await
            .map_err(|e| {
                StorageError::Internal(format!("Failed to save {}: {}", T::TYPE_NAME, e))
            })?;
        tracing::debug!("Saved {} {}", T::TYPE_NAME, document.id());
        Ok(document)
    }
}

#[async_trait]
impl<T: Document> DocumentStore<T> for CouchbaseStorage {
    async fn insert(&self, document: T) -> Result<T, StorageError> {
        self.ensure_unique(&document).await?;
        self.upsert(document).await
    }

    async fn update(&self, document: T) -> Result<T, StorageError> {
        let existing: Option<T> = self.find_by_id(document.id()).await?;
        if existing.is_none() {
            return Err(StorageError::NotFound(format!(
                "{} with id {} not found",
                T::TYPE_NAME,
                document.id()
            )));
        }
        self.ensure_unique(&document).await?;
        self.upsert(document).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, StorageError> {
        let key = Self::doc_key::<T>(id);

        match self.collection.get(&key, GetOptions::default()).await {
            Ok(result) => {
                let document: T = result.content_as::<T>().map_err(|e| {
                    StorageError::Internal(format!(
                        "Failed to decode {} {}: {}",
                        T::TYPE_NAME,
                        id,
                        e
                    ))
                })?;
                Ok(Some(document))
            }
            Err(e) => {
                if e.to_string().contains("DocumentNotFound") {
                    Ok(None)
                } else {
                    Err(StorageError::Internal(format!(
                        "Failed to get {}: {}",
                        T::TYPE_NAME,
                        e
                    )))
                }
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let key = Self::doc_key::<T>(id);

        match self.collection.remove(&key, RemoveOptions::default()).await {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.to_string().contains("DocumentNotFound") {
                    Err(StorageError::NotFound(format!(
                        "{} with id {} not found",
                        T::TYPE_NAME,
                        id
                    )))
                } else {
                    Err(StorageError::Internal(format!(
                        "Failed to delete {}: {}",
                        T::TYPE_NAME,
                        e
                    )))
                }
            }
        }
    }

    async fn find(
        &self,
        criteria: &T::Criteria,
        page: Option<PageRequest>,
    ) -> Result<SearchResult<T>, StorageError> {
        let where_clause = Self::where_clause::<T>(&criteria.predicates());

        let count_statement = format!(
            "SELECT RAW COUNT(*) FROM `{}` t WHERE {}",
            self.bucket_name, where_clause
        );
        let counts: Vec<u64> = self.query(&count_statement).await?;
        let total = counts.into_iter().next().unwrap_or(0);

        let paging = match page {
            Some(page) => format!(" LIMIT {} OFFSET {}", page.size, page.page * page.size),
            None => String::new(),
        };
        let statement = format!(
            "SELECT t.* FROM `{}` t WHERE {} ORDER BY t.created_at ASC, t.id ASC{}",
            self.bucket_name, where_clause, paging
        );
        let records: Vec<T> = self.query(&statement).await?;

        Ok(SearchResult { total, records })
    }
}
