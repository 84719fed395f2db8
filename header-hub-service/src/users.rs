//! User account operations

use std::sync::Arc;

use header_hub_core::{
    PageRequest, SearchResult, User, UserInput, UserSearchCriteria, ValidationError,
};
use header_hub_storage::DocumentStore;

use crate::{AuditLogger, DocumentEngine, ServiceError};

pub struct UserService {
    engine: DocumentEngine<User>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore<User>>, audit: AuditLogger) -> Self {
        Self {
            engine: DocumentEngine::new(store, audit),
        }
    }

    pub async fn create(&self, input: UserInput, actor: &str) -> Result<User, ServiceError> {
        let user = input.validate()?;
        self.engine.create(user, actor).await
    }

    pub async fn update(
        &self,
        id: &str,
        input: UserInput,
        actor: &str,
    ) -> Result<User, ServiceError> {
        let user = input.validate()?;
        self.engine.update(id, user, actor).await
    }

    pub async fn get(&self, id: &str) -> Result<User, ServiceError> {
        self.engine.get(id).await
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<(), ServiceError> {
        self.engine.delete(id, actor).await
    }

    pub async fn search(
        &self,
        criteria: &UserSearchCriteria,
        page: Option<PageRequest>,
    ) -> Result<SearchResult<User>, ServiceError> {
        self.engine.search(criteria, page).await
    }

    /// Exact-match lookup by username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        if username.trim().is_empty() {
            return Err(ValidationError(
                "username should be valid string(not null and not empty)".to_owned(),
            )
            .into());
        }
        let criteria = UserSearchCriteria {
            username: Some(username.to_owned()),
            ..Default::default()
        };
        let found = self.engine.search(&criteria, None).await?;
        Ok(found
            .records
            .into_iter()
            .find(|user| user.username == username))
    }
}
