//! Application state shared across handlers

use std::sync::Arc;

use header_hub_core::LdapConfiguration;
use header_hub_directory::{DirectoryProvider, DirectoryService, DirectorySettings};
use header_hub_evaluator::HeaderEvaluator;
use header_hub_service::{
    ActivityLogService, AuditLogger, HeaderService, LdapAttributeService,
    LdapConfigurationService, ModuleService, PolicyService, SystemService, UserService,
};
use header_hub_storage::ConfigStore;

use crate::{auth::JwtService, ApiError};

/// Shared application state.
pub struct AppState {
    pub systems: Arc<SystemService>,
    pub modules: Arc<ModuleService>,
    pub headers: Arc<HeaderService>,
    pub policies: Arc<PolicyService>,
    pub users: Arc<UserService>,
    pub ldap_configurations: Arc<LdapConfigurationService>,
    pub ldap_attributes: Arc<LdapAttributeService>,
    pub activity_logs: Arc<ActivityLogService>,
    pub evaluator: HeaderEvaluator,
    pub jwt: JwtService,
    pub directory: Arc<dyn DirectoryProvider>,
}

impl AppState {
    /// Wire the services over one storage backend.
    pub fn with_store<S>(
        store: Arc<S>,
        directory: Arc<dyn DirectoryProvider>,
        jwt: JwtService,
    ) -> Self
    where
        S: ConfigStore + 'static,
    {
        let audit = AuditLogger::new(store.clone());
        let systems = Arc::new(SystemService::new(store.clone(), audit.clone()));
        let modules = Arc::new(ModuleService::new(
            store.clone(),
            audit.clone(),
            systems.clone(),
        ));
        let headers = Arc::new(HeaderService::new(store.clone(), audit.clone()));
        let policies = Arc::new(PolicyService::new(
            store.clone(),
            audit.clone(),
            modules.clone(),
            headers.clone(),
        ));
        let users = Arc::new(UserService::new(store.clone(), audit.clone()));
        let ldap_configurations = Arc::new(LdapConfigurationService::new(
            store.clone(),
            audit.clone(),
        ));
        let ldap_attributes = Arc::new(LdapAttributeService::new(store.clone()));
        let activity_logs = Arc::new(ActivityLogService::new(store));

        Self {
            evaluator: HeaderEvaluator::new(policies.clone()),
            systems,
            modules,
            headers,
            policies,
            users,
            ldap_configurations,
            ldap_attributes,
            activity_logs,
            jwt,
            directory,
        }
    }

    /// Open a directory connection parameterized by the latest enabled LDAP
    /// configuration.
    pub async fn open_directory(&self) -> Result<Arc<dyn DirectoryService>, ApiError> {
        let configuration = self.ldap_configurations.latest_enabled().await?;
        let settings = directory_settings(&configuration);
        Ok(self.directory.open(&settings).await?)
    }
}

fn directory_settings(configuration: &LdapConfiguration) -> DirectorySettings {
    DirectorySettings {
        url: configuration.url.clone(),
        base: configuration.root.clone(),
        user_dn: configuration.user_dn.clone(),
        password: configuration.password.clone(),
        user_search_base: configuration.user_search_base.clone(),
        user_attribute: configuration.user_attribute.clone(),
    }
}
