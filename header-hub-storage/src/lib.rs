//! Storage layer for Header Hub
//!
//! Provides persistence for the configuration documents behind a generic
//! [`DocumentStore`] trait. Supports both an in-memory backend (for
//! development and tests) and Couchbase.

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "couchbase")]
pub mod couchbase;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use traits::DocumentStore;

#[cfg(feature = "couchbase")]
pub use couchbase::{CouchbaseConfig, CouchbaseStorage};

use header_hub_core::{
    ActivityLog, Header, LdapAttribute, LdapConfiguration, ModuleRecord, PolicyRecord, System,
    User,
};

/// Unified store over every configuration document type.
pub trait ConfigStore:
    DocumentStore<System>
    + DocumentStore<ModuleRecord>
    + DocumentStore<PolicyRecord>
    + DocumentStore<Header>
    + DocumentStore<User>
    + DocumentStore<LdapConfiguration>
    + DocumentStore<LdapAttribute>
    + DocumentStore<ActivityLog>
    + Send
    + Sync
{
}

impl<T> ConfigStore for T where
    T: DocumentStore<System>
        + DocumentStore<ModuleRecord>
        + DocumentStore<PolicyRecord>
        + DocumentStore<Header>
        + DocumentStore<User>
        + DocumentStore<LdapConfiguration>
        + DocumentStore<LdapAttribute>
        + DocumentStore<ActivityLog>
        + Send
        + Sync
{
}
