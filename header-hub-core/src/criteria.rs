//! Search criteria and paging types
//!
//! One criteria type per searchable document, mirroring the query parameters
//! of the corresponding search endpoint. String fields match by substring,
//! everything else by equality.

use serde::{Deserialize, Serialize};

use crate::document::{Criteria, Predicate};
use crate::models::{OperationType, Role};

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

/// Optional paging query parameters. Absent on both ends means "all records".
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub size: Option<u64>,
}

impl PageParams {
    pub fn into_page(self) -> Option<PageRequest> {
        if self.page.is_none() && self.size.is_none() {
            return None;
        }
        Some(PageRequest {
            page: self.page.unwrap_or(0),
            size: self.size.unwrap_or(20),
        })
    }
}

/// A page of search results with the total match count before paging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult<T> {
    pub total: u64,
    pub records: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemSearchCriteria {
    pub name: Option<String>,
}

impl Criteria for SystemSearchCriteria {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(name) = &self.name {
            predicates.push(Predicate::contains("name", name.clone()));
        }
        predicates
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleSearchCriteria {
    pub name: Option<String>,
    #[serde(alias = "systemId")]
    pub system_id: Option<String>,
}

impl Criteria for ModuleSearchCriteria {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(name) = &self.name {
            predicates.push(Predicate::contains("name", name.clone()));
        }
        if let Some(system_id) = &self.system_id {
            predicates.push(Predicate::equals("system_id", system_id.clone()));
        }
        predicates
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicySearchCriteria {
    pub name: Option<String>,
    pub enabled: Option<bool>,
    #[serde(alias = "moduleId")]
    pub module_id: Option<String>,
}

impl Criteria for PolicySearchCriteria {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(name) = &self.name {
            predicates.push(Predicate::contains("name", name.clone()));
        }
        if let Some(enabled) = self.enabled {
            predicates.push(Predicate::equals("enabled", enabled));
        }
        if let Some(module_id) = &self.module_id {
            predicates.push(Predicate::equals("module_id", module_id.clone()));
        }
        predicates
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderSearchCriteria {
    pub name: Option<String>,
}

impl Criteria for HeaderSearchCriteria {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(name) = &self.name {
            predicates.push(Predicate::contains("header_name", name.clone()));
        }
        predicates
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSearchCriteria {
    pub username: Option<String>,
    pub role: Option<Role>,
    pub enabled: Option<bool>,
}

impl Criteria for UserSearchCriteria {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(username) = &self.username {
            predicates.push(Predicate::contains("username", username.clone()));
        }
        if let Some(role) = self.role {
            predicates.push(Predicate::equals("role", role.as_str()));
        }
        if let Some(enabled) = self.enabled {
            predicates.push(Predicate::equals("enabled", enabled));
        }
        predicates
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LdapConfigurationSearchCriteria {
    pub name: Option<String>,
    pub enabled: Option<bool>,
}

impl Criteria for LdapConfigurationSearchCriteria {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(name) = &self.name {
            predicates.push(Predicate::contains("name", name.clone()));
        }
        if let Some(enabled) = self.enabled {
            predicates.push(Predicate::equals("enabled", enabled));
        }
        predicates
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LdapAttributeSearchCriteria {
    pub name: Option<String>,
    pub enabled: Option<bool>,
}

impl Criteria for LdapAttributeSearchCriteria {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(name) = &self.name {
            predicates.push(Predicate::contains("name", name.clone()));
        }
        if let Some(enabled) = self.enabled {
            predicates.push(Predicate::equals("enabled", enabled));
        }
        predicates
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityLogSearchCriteria {
    #[serde(alias = "operationType")]
    pub operation_type: Option<OperationType>,
    #[serde(alias = "documentType")]
    pub document_type: Option<String>,
    #[serde(alias = "operatedBy")]
    pub operated_by: Option<String>,
    pub description: Option<String>,
}

impl Criteria for ActivityLogSearchCriteria {
    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(operation_type) = self.operation_type {
            predicates.push(Predicate::equals("operation_type", operation_type.as_str()));
        }
        if let Some(document_type) = &self.document_type {
            predicates.push(Predicate::contains("document_type", document_type.clone()));
        }
        if let Some(operated_by) = &self.operated_by {
            predicates.push(Predicate::contains("operated_by", operated_by.clone()));
        }
        if let Some(description) = &self.description {
            predicates.push(Predicate::contains("description", description.clone()));
        }
        predicates
    }
}
