//! Audit logging
//!
//! One immutable ActivityLog entry per persistence operation. The actor is
//! passed in explicitly by the caller; there is no ambient request context
//! to reach into. The entry is written synchronously after the change it
//! records, with no atomicity between the two.

use std::fmt::Debug;
use std::sync::Arc;

use header_hub_core::{ActivityLog, Document, OperationType};
use header_hub_storage::DocumentStore;

use crate::ServiceError;

#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn DocumentStore<ActivityLog>>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn DocumentStore<ActivityLog>>) -> Self {
        Self { store }
    }

    /// Record one operation on a document of type `T`.
    pub async fn record<T: Document>(
        &self,
        operation_type: OperationType,
        before: Option<&T>,
        after: Option<&T>,
        actor: &str,
    ) -> Result<(), ServiceError> {
        let description = format!("BEFORE: {}\nAFTER: {}", dump(before), dump(after));
        let entry = ActivityLog::new(operation_type, T::TYPE_NAME, actor, description);
        self.store.insert(entry).await?;
        Ok(())
    }
}

fn dump<T: Debug>(document: Option<&T>) -> String {
    match document {
        Some(document) => format!("{document:?}"),
        None => "null".to_owned(),
    }
}
