//! The header evaluation algorithm
//!
//! For each enabled policy (optionally filtered by module), each rule's
//! attribute pairs are joined into a `name=value,...` expression and
//! evaluated as an existence predicate against the directory, one round
//! trip per rule. Static headers are emitted immediately in traversal
//! order; dynamic headers are collected in first-seen order and resolved
//! with a single batched attribute lookup, so every dynamic result follows
//! every static one. A header name contributes at most once per evaluation:
//! later matches are dropped with a warning.

use std::sync::Arc;

use header_hub_core::{Header, HeaderEvaluateResult, HeaderType, PolicySearchCriteria};
use header_hub_directory::{AttributeValue, DirectoryService};
use header_hub_service::PolicyService;
use tracing::warn;

use crate::EvaluateError;

#[derive(Clone)]
pub struct HeaderEvaluator {
    policies: Arc<PolicyService>,
}

impl HeaderEvaluator {
    pub fn new(policies: Arc<PolicyService>) -> Self {
        Self { policies }
    }

    pub async fn evaluate(
        &self,
        directory: &dyn DirectoryService,
        username: &str,
        module_id: Option<&str>,
    ) -> Result<Vec<HeaderEvaluateResult>, EvaluateError> {
        if username.trim().is_empty() {
            return Err(EvaluateError::Validation(
                "username should be valid string(not null and not empty)".to_owned(),
            ));
        }

        let user_dn = directory
            .find_user_dn(username)
            .await?
            .ok_or_else(|| {
                EvaluateError::NotFound(format!(
                    "There is no directory user with username '{username}' found"
                ))
            })?;

        let criteria = PolicySearchCriteria {
            enabled: Some(true),
            module_id: module_id.map(str::to_owned),
            ..Default::default()
        };
        let policies = self.policies.search(&criteria, None).await?.records;

        let mut seen_names: Vec<String> = Vec::new();
        let mut results: Vec<HeaderEvaluateResult> = Vec::new();
        let mut pending_dynamic: Vec<Header> = Vec::new();

        for policy in &policies {
            for rule in &policy.rules {
                // Dangling header references and empty rule info should not
                // survive write-time validation; skip them if they do.
                let Some(header) = &rule.header else { continue };
                if rule.rule_info.is_empty() {
                    continue;
                }

                let expression = rule
                    .rule_info
                    .iter()
                    .map(|pair| format!("{}={}", pair.name, pair.value))
                    .collect::<Vec<_>>()
                    .join(",");
                if !directory.evaluate_rule(&expression).await? {
                    continue;
                }

                if seen_names.contains(&header.header_name) {
                    warn!(
                        "Already exist static or dynamic header with name '{}'",
                        header.header_name
                    );
                    continue;
                }
                seen_names.push(header.header_name.clone());

                match header.header_type {
                    HeaderType::Static => results.push(HeaderEvaluateResult {
                        name: header.header_name.clone(),
                        value: header.value.clone(),
                    }),
                    HeaderType::Dynamic => pending_dynamic.push(header.clone()),
                }
            }
        }

        if !pending_dynamic.is_empty() {
            // One batched lookup for every dynamic header of this DN.
            let mut attributes: Vec<String> = Vec::new();
            for header in &pending_dynamic {
                if !attributes.contains(&header.value) {
                    attributes.push(header.value.clone());
                }
            }
            let values = directory.get_user_attributes(&user_dn, &attributes).await?;

            for header in &pending_dynamic {
                if let Some(value) = values.get(&header.value) {
                    let rendered = match value {
                        None => "null".to_owned(),
                        Some(AttributeValue::Single(single)) => single.clone(),
                        Some(AttributeValue::Multi(many)) => many.join(","),
                    };
                    results.push(HeaderEvaluateResult {
                        name: header.header_name.clone(),
                        value: rendered,
                    });
                }
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use header_hub_core::PolicyInput;
    use header_hub_directory::InMemoryDirectory;
    use header_hub_service::{
        AuditLogger, HeaderService, ModuleService, PolicyService, SystemService,
    };
    use header_hub_storage::MemoryStore;
    use serde_json::json;

    struct Fixture {
        policies: Arc<PolicyService>,
        evaluator: HeaderEvaluator,
        directory: InMemoryDirectory,
        module_id: String,
    }

    const ALICE_DN: &str = "uid=alice,ou=people,dc=example,dc=org";

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let audit = AuditLogger::new(store.clone());
        let systems = Arc::new(SystemService::new(store.clone(), audit.clone()));
        let modules = Arc::new(ModuleService::new(
            store.clone(),
            audit.clone(),
            systems,
        ));
        let headers = Arc::new(HeaderService::new(store.clone(), audit.clone()));
        let policies = Arc::new(PolicyService::new(store, audit, modules.clone(), headers));

        let module = modules
            .create(
                serde_json::from_value(
                    json!({"name": "intranet", "system": {"name": "portal"}}),
                )
                .unwrap(),
                "seed",
            )
            .await
            .unwrap();

        let directory = InMemoryDirectory::new();
        directory.add_user("alice", ALICE_DN, "s3cret");
        directory.set_attribute("alice", "department", vec!["engineering".into()]);
        directory.set_attribute("alice", "uid", vec!["alice".into()]);
        directory.set_attribute(
            "alice",
            "memberOf",
            vec!["admins".into(), "builders".into()],
        );

        Fixture {
            evaluator: HeaderEvaluator::new(policies.clone()),
            policies,
            directory,
            module_id: module.id,
        }
    }

    impl Fixture {
        async fn seed_policy(&self, value: serde_json::Value) -> header_hub_core::Policy {
            let input: PolicyInput = serde_json::from_value(value).unwrap();
            self.policies.create(input, "seed").await.unwrap()
        }

        async fn evaluate(&self, username: &str) -> Vec<HeaderEvaluateResult> {
            self.evaluator
                .evaluate(&self.directory, username, None)
                .await
                .unwrap()
        }
    }

    fn result(name: &str, value: &str) -> HeaderEvaluateResult {
        HeaderEvaluateResult {
            name: name.to_owned(),
            value: value.to_owned(),
        }
    }

    #[tokio::test]
    async fn static_header_for_matching_rule() {
        let fixture = fixture().await;
        fixture
            .seed_policy(json!({
                "name": "engineers", "enabled": true,
                "module": {"id": fixture.module_id},
                "rules": [{
                    "rule_info": [{"name": "department", "value": "engineering"}],
                    "header": {"type": "Static", "header_name": "x-eng", "value": "True"}
                }]
            }))
            .await;

        assert_eq!(fixture.evaluate("alice").await, vec![result("x-eng", "True")]);
    }

    #[tokio::test]
    async fn non_matching_rule_contributes_nothing() {
        let fixture = fixture().await;
        fixture
            .seed_policy(json!({
                "name": "sales", "enabled": true,
                "module": {"id": fixture.module_id},
                "rules": [{
                    "rule_info": [{"name": "department", "value": "sales"}],
                    "header": {"type": "Static", "header_name": "x-sales", "value": "True"}
                }]
            }))
            .await;

        assert!(fixture.evaluate("alice").await.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found_distinct_from_no_matches() {
        let fixture = fixture().await;
        let err = fixture
            .evaluator
            .evaluate(&fixture.directory, "ghost", None)
            .await
            .unwrap_err();
        match err {
            EvaluateError::NotFound(message) => {
                assert_eq!(
                    message,
                    "There is no directory user with username 'ghost' found"
                )
            }
            other => panic!("expected not found, got {other:?}"),
        }

        // A known user with zero matching policies is an empty list, not an
        // error.
        assert!(fixture.evaluate("alice").await.is_empty());
    }

    #[tokio::test]
    async fn blank_username_is_a_validation_error() {
        let fixture = fixture().await;
        let err = fixture
            .evaluator
            .evaluate(&fixture.directory, "  ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, EvaluateError::Validation(_)));
    }

    #[tokio::test]
    async fn disabled_policies_are_ignored() {
        let fixture = fixture().await;
        fixture
            .seed_policy(json!({
                "name": "dormant", "enabled": false,
                "module": {"id": fixture.module_id},
                "rules": [{
                    "rule_info": [{"name": "department", "value": "engineering"}],
                    "header": {"type": "Static", "header_name": "x-dormant", "value": "True"}
                }]
            }))
            .await;

        assert!(fixture.evaluate("alice").await.is_empty());
    }

    #[tokio::test]
    async fn first_seen_header_wins_across_policies() {
        let fixture = fixture().await;
        let first = fixture
            .seed_policy(json!({
                "name": "p1", "enabled": true,
                "module": {"id": fixture.module_id},
                "rules": [{
                    "rule_info": [{"name": "department", "value": "engineering"}],
                    "header": {"type": "Static", "header_name": "x-eng", "value": "True"}
                }]
            }))
            .await;
        let header_id = first.rules[0].header.as_ref().unwrap().id.clone();
        // A second policy whose rule points at the same header.
        fixture
            .seed_policy(json!({
                "name": "p2", "enabled": true,
                "module": {"id": fixture.module_id},
                "rules": [{
                    "rule_info": [{"name": "memberOf", "value": "admins"}],
                    "header": {"id": header_id}
                }]
            }))
            .await;

        // Both rules match; the header is emitted exactly once.
        assert_eq!(fixture.evaluate("alice").await, vec![result("x-eng", "True")]);
    }

    #[tokio::test]
    async fn dynamic_header_resolves_directory_attribute() {
        let fixture = fixture().await;
        fixture
            .seed_policy(json!({
                "name": "uid", "enabled": true,
                "module": {"id": fixture.module_id},
                "rules": [{
                    "rule_info": [{"name": "department", "value": "engineering"}],
                    "header": {"type": "Dynamic", "header_name": "x-uid", "value": "uid"}
                }]
            }))
            .await;

        assert_eq!(fixture.evaluate("alice").await, vec![result("x-uid", "alice")]);
    }

    #[tokio::test]
    async fn missing_dynamic_attribute_renders_null_literal() {
        let fixture = fixture().await;
        fixture
            .seed_policy(json!({
                "name": "mail", "enabled": true,
                "module": {"id": fixture.module_id},
                "rules": [{
                    "rule_info": [{"name": "department", "value": "engineering"}],
                    "header": {"type": "Dynamic", "header_name": "x-mail", "value": "mail"}
                }]
            }))
            .await;

        assert_eq!(fixture.evaluate("alice").await, vec![result("x-mail", "null")]);
    }

    #[tokio::test]
    async fn multi_valued_attribute_joins_with_commas() {
        let fixture = fixture().await;
        fixture
            .seed_policy(json!({
                "name": "groups", "enabled": true,
                "module": {"id": fixture.module_id},
                "rules": [{
                    "rule_info": [{"name": "department", "value": "engineering"}],
                    "header": {"type": "Dynamic", "header_name": "x-groups", "value": "memberOf"}
                }]
            }))
            .await;

        assert_eq!(
            fixture.evaluate("alice").await,
            vec![result("x-groups", "admins,builders")]
        );
    }

    #[tokio::test]
    async fn statics_precede_dynamics_which_keep_first_seen_order() {
        let fixture = fixture().await;
        fixture
            .seed_policy(json!({
                "name": "mixed", "enabled": true,
                "module": {"id": fixture.module_id},
                "rules": [
                    {
                        "rule_info": [{"name": "department", "value": "engineering"}],
                        "header": {"type": "Dynamic", "header_name": "x-uid", "value": "uid"}
                    },
                    {
                        "rule_info": [{"name": "memberOf", "value": "admins"}],
                        "header": {"type": "Static", "header_name": "x-eng", "value": "True"}
                    },
                    {
                        "rule_info": [{"name": "memberOf", "value": "builders"}],
                        "header": {"type": "Dynamic", "header_name": "x-groups", "value": "memberOf"}
                    }
                ]
            }))
            .await;

        assert_eq!(
            fixture.evaluate("alice").await,
            vec![
                result("x-eng", "True"),
                result("x-uid", "alice"),
                result("x-groups", "admins,builders"),
            ]
        );
    }

    #[tokio::test]
    async fn module_filter_limits_candidate_policies() {
        let fixture = fixture().await;
        fixture
            .seed_policy(json!({
                "name": "in-module", "enabled": true,
                "module": {"id": fixture.module_id},
                "rules": [{
                    "rule_info": [{"name": "department", "value": "engineering"}],
                    "header": {"type": "Static", "header_name": "x-in", "value": "True"}
                }]
            }))
            .await;
        fixture
            .seed_policy(json!({
                "name": "elsewhere", "enabled": true,
                "module": {"name": "extranet", "system": {"name": "portal-2"}},
                "rules": [{
                    "rule_info": [{"name": "department", "value": "engineering"}],
                    "header": {"type": "Static", "header_name": "x-out", "value": "True"}
                }]
            }))
            .await;

        let scoped = fixture
            .evaluator
            .evaluate(&fixture.directory, "alice", Some(&fixture.module_id))
            .await
            .unwrap();
        assert_eq!(scoped, vec![result("x-in", "True")]);

        let unscoped = fixture.evaluate("alice").await;
        assert_eq!(unscoped.len(), 2);
    }

    #[tokio::test]
    async fn evaluation_is_idempotent() {
        let fixture = fixture().await;
        fixture
            .seed_policy(json!({
                "name": "mixed", "enabled": true,
                "module": {"id": fixture.module_id},
                "rules": [
                    {
                        "rule_info": [{"name": "department", "value": "engineering"}],
                        "header": {"type": "Static", "header_name": "x-eng", "value": "True"}
                    },
                    {
                        "rule_info": [{"name": "memberOf", "value": "admins"}],
                        "header": {"type": "Dynamic", "header_name": "x-uid", "value": "uid"}
                    }
                ]
            }))
            .await;

        let first = fixture.evaluate("alice").await;
        let second = fixture.evaluate("alice").await;
        assert_eq!(first, second);
    }
}
