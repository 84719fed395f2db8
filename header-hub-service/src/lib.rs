//! Service layer for Header Hub
//!
//! A single generic document engine provides create/update/get/delete/search
//! with audit logging; per-entity services layer reference resolution,
//! domain validation and hydration on top of it.

pub mod activity_logs;
pub mod audit;
pub mod engine;
pub mod error;
pub mod headers;
pub mod ldap_attributes;
pub mod ldap_configurations;
pub mod modules;
pub mod policies;
pub mod systems;
pub mod users;

pub use activity_logs::ActivityLogService;
pub use audit::AuditLogger;
pub use engine::DocumentEngine;
pub use error::ServiceError;
pub use headers::HeaderService;
pub use ldap_attributes::LdapAttributeService;
pub use ldap_configurations::LdapConfigurationService;
pub use modules::ModuleService;
pub use policies::PolicyService;
pub use systems::SystemService;
pub use users::UserService;
