//! Configuration documents
//!
//! Stored records keep nested entities by reference (`*_id` fields); the
//! hydrated view types (`Module`, `Policy`, `Rule`) carry the resolved
//! documents and are what the API returns and the evaluator consumes. A
//! reference whose target has been deleted hydrates to `None`, since
//! deletion does not cascade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::criteria::{
    ActivityLogSearchCriteria, HeaderSearchCriteria, LdapAttributeSearchCriteria,
    LdapConfigurationSearchCriteria, ModuleSearchCriteria, PolicySearchCriteria,
    SystemSearchCriteria, UserSearchCriteria,
};
use crate::document::{Document, UniqueKey};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// The static/dynamic header types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderType {
    Static,
    Dynamic,
}

/// The audited operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Create,
    Change,
    Delete,
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Create => "Create",
            OperationType::Change => "Change",
            OperationType::Delete => "Delete",
        }
    }
}

/// Application user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Read-only access.
    RO,
    /// Read/write access.
    RW,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::RO => "RO",
            Role::RW => "RW",
            Role::Admin => "Admin",
        }
    }

    /// Whether this role may use the write path (create/update/delete).
    pub fn can_write(self) -> bool {
        matches!(self, Role::RW | Role::Admin)
    }
}

/// A system: the root of the configuration hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct System {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
}

impl System {
    pub fn new(name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            created_at: now,
            last_modified_at: now,
            name,
            description,
        }
    }
}

/// A module, stored with its owning system by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub system_id: String,
}

impl ModuleRecord {
    pub fn new(name: String, description: Option<String>, system_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            created_at: now,
            last_modified_at: now,
            name,
            description,
            system_id,
        }
    }
}

/// The hydrated module view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub system: Option<System>,
}

impl Module {
    pub fn from_record(record: ModuleRecord, system: Option<System>) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            last_modified_at: record.last_modified_at,
            name: record.name,
            description: record.description,
            system,
        }
    }
}

/// A directory attribute name/value pair of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeNameValue {
    pub name: String,
    pub value: String,
}

/// A rule as stored inside its policy: the header by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRecord {
    pub name: Option<String>,
    pub rule_info: Vec<AttributeNameValue>,
    pub header_id: String,
}

/// A policy, stored with its module and rule headers by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub rules: Vec<RuleRecord>,
    pub module_id: String,
}

impl PolicyRecord {
    pub fn new(
        name: String,
        description: Option<String>,
        enabled: bool,
        rules: Vec<RuleRecord>,
        module_id: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            created_at: now,
            last_modified_at: now,
            name,
            description,
            enabled,
            rules,
            module_id,
        }
    }
}

/// The hydrated rule view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: Option<String>,
    pub rule_info: Vec<AttributeNameValue>,
    pub header: Option<Header>,
}

/// The hydrated policy view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub rules: Vec<Rule>,
    pub module: Option<Module>,
}

impl Policy {
    /// Assemble the view from a stored record plus the resolved references,
    /// keyed by header id. Unresolvable headers stay `None`.
    pub fn from_record(
        record: PolicyRecord,
        module: Option<Module>,
        headers: &HashMap<String, Header>,
    ) -> Self {
        let rules = record
            .rules
            .into_iter()
            .map(|rule| Rule {
                header: headers.get(&rule.header_id).cloned(),
                name: rule.name,
                rule_info: rule.rule_info,
            })
            .collect();
        Self {
            id: record.id,
            created_at: record.created_at,
            last_modified_at: record.last_modified_at,
            name: record.name,
            description: record.description,
            enabled: record.enabled,
            rules,
            module,
        }
    }
}

/// A response header definition.
///
/// For `Static` headers the value is the literal `"True"` or `"False"`; for
/// `Dynamic` headers it names the directory attribute resolved per user at
/// evaluation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub header_type: HeaderType,
    pub header_name: String,
    pub description: Option<String>,
    pub value: String,
}

impl Header {
    pub fn new(
        header_type: HeaderType,
        header_name: String,
        description: Option<String>,
        value: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            created_at: now,
            last_modified_at: now,
            header_type,
            header_name,
            description,
            value,
        }
    }
}

/// An application user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub username: String,
    pub role: Role,
    pub enabled: bool,
}

impl User {
    pub fn new(username: String, role: Role, enabled: bool) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            created_at: now,
            last_modified_at: now,
            username,
            role,
            enabled,
        }
    }
}

/// Connection settings for the directory service. The latest-modified
/// enabled configuration is the one in effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfiguration {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub name: String,
    pub url: String,
    pub root: String,
    pub user_dn: String,
    pub password: String,
    pub user_search_base: String,
    pub user_attribute: String,
    pub enabled: bool,
}

impl LdapConfiguration {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        url: String,
        root: String,
        user_dn: String,
        password: String,
        user_search_base: String,
        user_attribute: String,
        enabled: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            created_at: now,
            last_modified_at: now,
            name,
            url,
            root,
            user_dn,
            password,
            user_search_base,
            user_attribute,
            enabled,
        }
    }
}

/// A directory attribute known to the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapAttribute {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub name: String,
    pub enabled: bool,
}

impl LdapAttribute {
    pub fn new(name: String, enabled: bool) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            created_at: now,
            last_modified_at: now,
            name,
            enabled,
        }
    }
}

/// An append-only audit entry. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub operation_type: OperationType,
    pub document_type: String,
    pub operated_by: String,
    pub description: String,
}

impl ActivityLog {
    pub fn new(
        operation_type: OperationType,
        document_type: &str,
        operated_by: &str,
        description: String,
    ) -> Self {
        Self {
            id: new_id(),
            created_at: Utc::now(),
            operation_type,
            document_type: document_type.to_owned(),
            operated_by: operated_by.to_owned(),
            description,
        }
    }
}

/// One evaluated header: what the gateway should attach. Transient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEvaluateResult {
    pub name: String,
    pub value: String,
}

macro_rules! impl_document {
    ($ty:ty, $type_name:literal, $criteria:ty, |$doc:ident| $unique_key:expr) => {
        impl Document for $ty {
            const TYPE_NAME: &'static str = $type_name;
            type Criteria = $criteria;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn set_created_at(&mut self, at: DateTime<Utc>) {
                self.created_at = at;
            }

            fn touch(&mut self, at: DateTime<Utc>) {
                self.last_modified_at = at;
            }

            fn unique_key(&self) -> Option<UniqueKey> {
                let $doc = self;
                $unique_key
            }
        }
    };
}

impl_document!(System, "System", SystemSearchCriteria, |doc| {
    Some(UniqueKey {
        index: "name",
        fields: vec![("name", doc.name.clone().into())],
    })
});

impl_document!(ModuleRecord, "Module", ModuleSearchCriteria, |doc| {
    Some(UniqueKey {
        index: "name_system",
        fields: vec![
            ("name", doc.name.clone().into()),
            ("system_id", doc.system_id.clone().into()),
        ],
    })
});

impl_document!(PolicyRecord, "Policy", PolicySearchCriteria, |doc| {
    Some(UniqueKey {
        index: "name_module",
        fields: vec![
            ("name", doc.name.clone().into()),
            ("module_id", doc.module_id.clone().into()),
        ],
    })
});

impl_document!(Header, "Header", HeaderSearchCriteria, |doc| {
    Some(UniqueKey {
        index: "header_name",
        fields: vec![("header_name", doc.header_name.clone().into())],
    })
});

impl_document!(User, "User", UserSearchCriteria, |doc| {
    Some(UniqueKey {
        index: "username",
        fields: vec![("username", doc.username.clone().into())],
    })
});

impl_document!(
    LdapConfiguration,
    "LdapConfiguration",
    LdapConfigurationSearchCriteria,
    |doc| {
        Some(UniqueKey {
            index: "name",
            fields: vec![("name", doc.name.clone().into())],
        })
    }
);

impl_document!(
    LdapAttribute,
    "LdapAttribute",
    LdapAttributeSearchCriteria,
    |doc| {
        let _ = doc;
        None
    }
);

impl Document for ActivityLog {
    const TYPE_NAME: &'static str = "ActivityLog";
    type Criteria = ActivityLogSearchCriteria;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }

    fn touch(&mut self, _at: DateTime<Utc>) {}

    fn unique_key(&self) -> Option<UniqueKey> {
        None
    }
}
