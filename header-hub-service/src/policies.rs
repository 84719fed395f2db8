//! Policy operations
//!
//! Persisting a policy resolves its references depth-first: each rule's
//! header, then the policy's module (which first resolves its system), then
//! the policy itself. Every resolved nested write produces its own audit
//! entry. The cascade is not atomic: a failure partway through leaves the
//! nested writes already made in place and propagates the error unchanged.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use header_hub_core::{
    Header, Module, ModuleInput, NestedDoc, PageRequest, Policy, PolicyInput, PolicyRecord,
    PolicySearchCriteria, RuleParts, RuleRecord, SearchResult, ValidationError,
};
use header_hub_storage::DocumentStore;

use crate::{AuditLogger, DocumentEngine, HeaderService, ModuleService, ServiceError};

pub struct PolicyService {
    engine: DocumentEngine<PolicyRecord>,
    modules: Arc<ModuleService>,
    headers: Arc<HeaderService>,
}

struct ResolvedPolicy {
    rules: Vec<RuleRecord>,
    module: Module,
    headers: HashMap<String, Header>,
}

impl PolicyService {
    pub fn new(
        store: Arc<dyn DocumentStore<PolicyRecord>>,
        audit: AuditLogger,
        modules: Arc<ModuleService>,
        headers: Arc<HeaderService>,
    ) -> Self {
        Self {
            engine: DocumentEngine::new(store, audit),
            modules,
            headers,
        }
    }

    pub async fn create(&self, input: PolicyInput, actor: &str) -> Result<Policy, ServiceError> {
        let parts = input.validate()?;
        let resolved = self
            .resolve_references(parts.rules, parts.module, actor)
            .await?;
        let record = PolicyRecord::new(
            parts.name,
            parts.description,
            parts.enabled,
            resolved.rules,
            resolved.module.id.clone(),
        );
        let created = self.engine.create(record, actor).await?;
        Ok(Policy::from_record(
            created,
            Some(resolved.module),
            &resolved.headers,
        ))
    }

    pub async fn update(
        &self,
        id: &str,
        input: PolicyInput,
        actor: &str,
    ) -> Result<Policy, ServiceError> {
        let parts = input.validate()?;
        let resolved = self
            .resolve_references(parts.rules, parts.module, actor)
            .await?;
        let record = PolicyRecord::new(
            parts.name,
            parts.description,
            parts.enabled,
            resolved.rules,
            resolved.module.id.clone(),
        );
        let updated = self.engine.update(id, record, actor).await?;
        Ok(Policy::from_record(
            updated,
            Some(resolved.module),
            &resolved.headers,
        ))
    }

    pub async fn get(&self, id: &str) -> Result<Policy, ServiceError> {
        let record = self.engine.get(id).await?;
        self.hydrate(record).await
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<(), ServiceError> {
        self.engine.delete(id, actor).await
    }

    /// Delete policies one by one with single-delete semantics; the first
    /// failure aborts the remainder.
    pub async fn delete_by_ids(&self, ids: &[String], actor: &str) -> Result<(), ServiceError> {
        for id in ids {
            self.delete(id, actor).await?;
        }
        Ok(())
    }

    pub async fn search(
        &self,
        criteria: &PolicySearchCriteria,
        page: Option<PageRequest>,
    ) -> Result<SearchResult<Policy>, ServiceError> {
        let found = self.engine.search(criteria, page).await?;
        let mut records = Vec::with_capacity(found.records.len());
        for record in found.records {
            records.push(self.hydrate(record).await?);
        }
        Ok(SearchResult {
            total: found.total,
            records,
        })
    }

    /// Resolve every nested reference, leaves first: rule headers, then the
    /// module. Headers referenced by a policy's rules must end up with
    /// pairwise-distinct header names.
    async fn resolve_references(
        &self,
        rule_parts: Vec<RuleParts>,
        module: NestedDoc<ModuleInput>,
        actor: &str,
    ) -> Result<ResolvedPolicy, ServiceError> {
        let mut rules = Vec::with_capacity(rule_parts.len());
        let mut headers = HashMap::new();
        let mut header_names = HashSet::new();
        for rule in rule_parts {
            let header = self.headers.resolve(rule.header, actor).await?;
            if !header_names.insert(header.header_name.clone()) {
                return Err(ValidationError(
                    "Rules of Policy should not include duplicated header".to_owned(),
                )
                .into());
            }
            rules.push(RuleRecord {
                name: rule.name,
                rule_info: rule.rule_info,
                header_id: header.id.clone(),
            });
            headers.insert(header.id.clone(), header);
        }

        let module = self.modules.resolve(module, actor).await?;

        Ok(ResolvedPolicy {
            rules,
            module,
            headers,
        })
    }

    async fn hydrate(&self, record: PolicyRecord) -> Result<Policy, ServiceError> {
        let module = self.modules.find(&record.module_id).await?;
        let mut headers = HashMap::new();
        for rule in &record.rules {
            if let Some(header) = self.headers.find(&rule.header_id).await? {
                headers.insert(header.id.clone(), header);
            }
        }
        Ok(Policy::from_record(record, module, &headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SystemService;
    use header_hub_core::{ActivityLog, ActivityLogSearchCriteria, OperationType};
    use header_hub_storage::MemoryStore;
    use serde_json::json;

    struct Fixture {
        store: Arc<MemoryStore>,
        systems: Arc<SystemService>,
        modules: Arc<ModuleService>,
        headers: Arc<HeaderService>,
        policies: PolicyService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let audit = AuditLogger::new(store.clone());
        let systems = Arc::new(SystemService::new(store.clone(), audit.clone()));
        let modules = Arc::new(ModuleService::new(
            store.clone(),
            audit.clone(),
            systems.clone(),
        ));
        let headers = Arc::new(HeaderService::new(store.clone(), audit.clone()));
        let policies = PolicyService::new(
            store.clone(),
            audit.clone(),
            modules.clone(),
            headers.clone(),
        );
        Fixture {
            store,
            systems,
            modules,
            headers,
            policies,
        }
    }

    async fn audit_trail(store: &MemoryStore) -> Vec<(OperationType, String)> {
        let entries: header_hub_core::SearchResult<ActivityLog> = store
            .find(&ActivityLogSearchCriteria::default(), None)
            .await
            .unwrap();
        entries
            .records
            .into_iter()
            .map(|entry| (entry.operation_type, entry.document_type))
            .collect()
    }

    fn policy_input(value: serde_json::Value) -> PolicyInput {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn create_cascades_depth_first_with_one_audit_entry_each() {
        let fixture = fixture();
        let input = policy_input(json!({
            "name": "engineers",
            "enabled": true,
            "rules": [{
                "name": "eng",
                "rule_info": [{"name": "department", "value": "engineering"}],
                "header": {"type": "Static", "header_name": "x-eng", "value": "True"}
            }],
            "module": {"name": "intranet", "system": {"name": "portal"}}
        }));

        let policy = fixture.policies.create(input, "alice").await.unwrap();
        assert_eq!(policy.name, "engineers");
        let module = policy.module.as_ref().unwrap();
        assert_eq!(module.name, "intranet");
        assert_eq!(module.system.as_ref().unwrap().name, "portal");
        assert_eq!(
            policy.rules[0].header.as_ref().unwrap().header_name,
            "x-eng"
        );

        // Rule headers first, then the module's system, the module, and
        // finally the policy itself.
        let trail = audit_trail(&fixture.store).await;
        assert_eq!(
            trail,
            vec![
                (OperationType::Create, "Header".to_owned()),
                (OperationType::Create, "System".to_owned()),
                (OperationType::Create, "Module".to_owned()),
                (OperationType::Create, "Policy".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn reference_only_positions_produce_no_audit_entries() {
        let fixture = fixture();
        let system = fixture
            .systems
            .create(
                serde_json::from_value(json!({"name": "portal"})).unwrap(),
                "seed",
            )
            .await
            .unwrap();
        let module = fixture
            .modules
            .create(
                serde_json::from_value(
                    json!({"name": "intranet", "system": {"id": system.id}}),
                )
                .unwrap(),
                "seed",
            )
            .await
            .unwrap();
        let header = fixture
            .headers
            .create(
                serde_json::from_value(
                    json!({"type": "Static", "header_name": "x-eng", "value": "True"}),
                )
                .unwrap(),
                "seed",
            )
            .await
            .unwrap();
        let seeded = audit_trail(&fixture.store).await.len();

        let input = policy_input(json!({
            "name": "engineers",
            "enabled": true,
            "rules": [{
                "rule_info": [{"name": "department", "value": "engineering"}],
                "header": {"id": header.id}
            }],
            "module": {"id": module.id}
        }));
        fixture.policies.create(input, "alice").await.unwrap();

        let trail = audit_trail(&fixture.store).await;
        assert_eq!(trail.len(), seeded + 1, "only the policy write is audited");
        assert_eq!(trail.last().unwrap().1, "Policy");
    }

    #[tokio::test]
    async fn nested_id_with_fields_is_an_audited_update() {
        let fixture = fixture();
        let system = fixture
            .systems
            .create(
                serde_json::from_value(json!({"name": "portal"})).unwrap(),
                "seed",
            )
            .await
            .unwrap();
        let module = fixture
            .modules
            .create(
                serde_json::from_value(
                    json!({"name": "intranet", "system": {"id": system.id}}),
                )
                .unwrap(),
                "seed",
            )
            .await
            .unwrap();
        let header = fixture
            .headers
            .create(
                serde_json::from_value(
                    json!({"type": "Static", "header_name": "x-eng", "value": "True"}),
                )
                .unwrap(),
                "seed",
            )
            .await
            .unwrap();

        let input = policy_input(json!({
            "name": "engineers",
            "enabled": true,
            "rules": [{
                "rule_info": [{"name": "department", "value": "engineering"}],
                "header": {"id": header.id}
            }],
            "module": {
                "id": module.id,
                "name": "intranet-renamed",
                "system": {"id": system.id}
            }
        }));
        fixture.policies.create(input, "alice").await.unwrap();

        let trail = audit_trail(&fixture.store).await;
        assert!(trail.contains(&(OperationType::Change, "Module".to_owned())));
        let renamed = fixture.modules.get(&module.id).await.unwrap();
        assert_eq!(renamed.name, "intranet-renamed");
    }

    #[tokio::test]
    async fn rules_must_reference_distinct_header_names() {
        let fixture = fixture();
        let header = fixture
            .headers
            .create(
                serde_json::from_value(
                    json!({"type": "Static", "header_name": "x-eng", "value": "True"}),
                )
                .unwrap(),
                "seed",
            )
            .await
            .unwrap();

        let input = policy_input(json!({
            "name": "engineers",
            "enabled": true,
            "rules": [
                {"rule_info": [{"name": "a", "value": "1"}], "header": {"id": header.id}},
                {"rule_info": [{"name": "b", "value": "2"}], "header": {"id": header.id}}
            ],
            "module": {"name": "intranet", "system": {"name": "portal"}}
        }));
        let err = fixture.policies.create(input, "alice").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(err
            .to_string()
            .contains("should not include duplicated header"));
    }

    #[tokio::test]
    async fn missing_reference_is_not_found() {
        let fixture = fixture();
        let input = policy_input(json!({
            "name": "engineers",
            "enabled": true,
            "module": {"id": "no-such-module"}
        }));
        let err = fixture.policies.create(input, "alice").await.unwrap_err();
        match err {
            ServiceError::NotFound(message) => {
                assert_eq!(message, "Document with ID = no-such-module does not exist")
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_cascade_leaves_earlier_nested_writes() {
        let fixture = fixture();
        // The rule header resolves (and persists) before the module
        // reference fails; the header stays behind.
        let input = policy_input(json!({
            "name": "engineers",
            "enabled": true,
            "rules": [{
                "rule_info": [{"name": "department", "value": "engineering"}],
                "header": {"type": "Static", "header_name": "x-orphan", "value": "True"}
            }],
            "module": {"id": "no-such-module"}
        }));
        fixture.policies.create(input, "alice").await.unwrap_err();

        let headers = fixture
            .headers
            .search(&Default::default(), None)
            .await
            .unwrap();
        assert_eq!(headers.total, 1);
        assert_eq!(headers.records[0].header_name, "x-orphan");
    }

    #[tokio::test]
    async fn delete_by_ids_stops_at_first_failure() {
        let fixture = fixture();
        let module_json = json!({"name": "intranet", "system": {"name": "portal"}});
        let first = fixture
            .policies
            .create(
                policy_input(json!({
                    "name": "p1", "enabled": true, "module": module_json
                })),
                "seed",
            )
            .await
            .unwrap();
        let module_id = first.module.as_ref().unwrap().id.clone();
        let second = fixture
            .policies
            .create(
                policy_input(json!({
                    "name": "p2", "enabled": true, "module": {"id": module_id}
                })),
                "seed",
            )
            .await
            .unwrap();

        let ids = vec![
            first.id.clone(),
            "missing".to_owned(),
            second.id.clone(),
        ];
        let err = fixture
            .policies
            .delete_by_ids(&ids, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        // The first delete went through, the one after the failure did not.
        assert!(fixture.policies.get(&first.id).await.is_err());
        assert!(fixture.policies.get(&second.id).await.is_ok());
    }

    #[tokio::test]
    async fn update_preserves_creation_timestamp() {
        let fixture = fixture();
        let created = fixture
            .policies
            .create(
                policy_input(json!({
                    "name": "p1",
                    "enabled": true,
                    "module": {"name": "intranet", "system": {"name": "portal"}}
                })),
                "seed",
            )
            .await
            .unwrap();
        let module_id = created.module.as_ref().unwrap().id.clone();

        let updated = fixture
            .policies
            .update(
                &created.id,
                policy_input(json!({
                    "name": "p1",
                    "enabled": false,
                    "module": {"id": module_id}
                })),
                "alice",
            )
            .await
            .unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.last_modified_at >= created.last_modified_at);
        assert!(!updated.enabled);
    }
}
