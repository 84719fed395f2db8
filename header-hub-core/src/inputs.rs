//! Write-path input payloads
//!
//! A nested entity reference is a *type*, not an inferred shape: `{"id": X}`
//! alone deserializes as [`NestedDoc::Reference`] (link to an existing
//! document, no revalidation, no audit), while any other object is an
//! [`NestedDoc::Inline`] payload, created when it carries no id and updated
//! when it does.
//!
//! `validate()` converts a payload into its domain form, aggregating every
//! missing/blank required field into a single [`ValidationError`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ValidationError;
use crate::models::{
    AttributeNameValue, Header, HeaderType, LdapConfiguration, Role, System, User,
};
use crate::validate::{validate_header, validate_list, Violations};

/// A pure reference to an already-persisted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocRef {
    pub id: String,
}

/// A nested document position: either a reference or an inline payload.
///
/// `Reference` is tried first; `deny_unknown_fields` on [`DocRef`] makes any
/// object with more than an `id` fall through to `Inline`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NestedDoc<T> {
    Reference(DocRef),
    Inline(T),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SystemInput {
    pub fn validate(self) -> Result<System, ValidationError> {
        let mut violations = Violations::new();
        let name = violations.require(self.name, "name");
        match name {
            Some(name) => {
                violations.finish()?;
                Ok(System::new(name, self.description))
            }
            None => Err(violations.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system: Option<NestedDoc<SystemInput>>,
}

/// A validated module payload, its system still unresolved.
#[derive(Debug, Clone)]
pub struct ModuleParts {
    pub name: String,
    pub description: Option<String>,
    pub system: NestedDoc<SystemInput>,
}

impl ModuleInput {
    pub fn validate(self) -> Result<ModuleParts, ValidationError> {
        let mut violations = Violations::new();
        let name = violations.require(self.name, "name");
        let system = violations.require(self.system, "system");
        match (name, system) {
            (Some(name), Some(system)) => {
                violations.finish()?;
                Ok(ModuleParts {
                    name,
                    description: self.description,
                    system,
                })
            }
            _ => Err(violations.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub header_type: Option<HeaderType>,
    #[serde(default)]
    pub header_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl HeaderInput {
    pub fn validate(self) -> Result<Header, ValidationError> {
        let mut violations = Violations::new();
        let header_type = violations.require(self.header_type, "type");
        let header_name = violations.require(self.header_name, "header_name");
        let value = violations.require(self.value, "value");
        match (header_type, header_name, value) {
            (Some(header_type), Some(header_name), Some(value)) => {
                violations.finish()?;
                let header = Header::new(header_type, header_name, self.description, value);
                validate_header(&header)?;
                Ok(header)
            }
            _ => Err(violations.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameValueInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rule_info: Option<Vec<NameValueInput>>,
    #[serde(default)]
    pub header: Option<NestedDoc<HeaderInput>>,
}

/// A validated rule payload, its header still unresolved.
#[derive(Debug, Clone)]
pub struct RuleParts {
    pub name: Option<String>,
    pub rule_info: Vec<AttributeNameValue>,
    pub header: NestedDoc<HeaderInput>,
}

impl RuleInput {
    fn validate(self, violations: &mut Violations) -> Result<Option<RuleParts>, ValidationError> {
        let info = self.rule_info.unwrap_or_default();
        validate_list(&info, "rule_info", |entry| entry.name.clone())?;
        if info.is_empty() {
            violations.add("rules.rule_info", "must not be empty");
        }

        let mut pairs = Vec::with_capacity(info.len());
        let mut complete = true;
        for entry in info {
            let name = violations.require(entry.name, "rules.rule_info.name");
            let value = violations.require(entry.value, "rules.rule_info.value");
            match (name, value) {
                (Some(name), Some(value)) => pairs.push(AttributeNameValue { name, value }),
                _ => complete = false,
            }
        }

        let header = violations.require(self.header, "rules.header");
        match header {
            Some(header) if complete && !pairs.is_empty() => Ok(Some(RuleParts {
                name: self.name,
                rule_info: pairs,
                header,
            })),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub rules: Option<Vec<RuleInput>>,
    #[serde(default)]
    pub module: Option<NestedDoc<ModuleInput>>,
}

/// A validated policy payload, its module and rule headers still unresolved.
#[derive(Debug, Clone)]
pub struct PolicyParts {
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub rules: Vec<RuleParts>,
    pub module: NestedDoc<ModuleInput>,
}

impl PolicyInput {
    pub fn validate(self) -> Result<PolicyParts, ValidationError> {
        let rules_input = self.rules.unwrap_or_default();

        // Rule names are optional; uniqueness applies only to the named ones.
        let mut named = HashSet::new();
        for rule in &rules_input {
            if let Some(name) = &rule.name {
                if !named.insert(name.clone()) {
                    return Err(ValidationError(
                        "Rules of Policy should not include duplicated item".to_owned(),
                    ));
                }
            }
        }

        let mut violations = Violations::new();
        let name = violations.require(self.name, "name");
        let enabled = violations.require(self.enabled, "enabled");
        let module = violations.require(self.module, "module");

        let mut rules = Vec::with_capacity(rules_input.len());
        for rule in rules_input {
            rules.push(rule.validate(&mut violations)?);
        }

        match (name, enabled, module) {
            (Some(name), Some(enabled), Some(module)) if violations.is_empty() => Ok(PolicyParts {
                name,
                description: self.description,
                enabled,
                rules: rules.into_iter().flatten().collect(),
                module,
            }),
            _ => Err(violations.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl UserInput {
    pub fn validate(self) -> Result<User, ValidationError> {
        let mut violations = Violations::new();
        let username = violations.require(self.username, "username");
        let role = violations.require(self.role, "role");
        let enabled = violations.require(self.enabled, "enabled");
        match (username, role, enabled) {
            (Some(username), Some(role), Some(enabled)) => {
                violations.finish()?;
                Ok(User::new(username, role, enabled))
            }
            _ => Err(violations.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LdapConfigurationInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub user_dn: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub user_search_base: Option<String>,
    #[serde(default)]
    pub user_attribute: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl LdapConfigurationInput {
    pub fn validate(self) -> Result<LdapConfiguration, ValidationError> {
        let mut violations = Violations::new();
        let name = violations.require(self.name, "name");
        let url = violations.require(self.url, "url");
        let root = violations.require(self.root, "root");
        let user_dn = violations.require(self.user_dn, "user_dn");
        let password = violations.require(self.password, "password");
        let user_search_base = violations.require_text(self.user_search_base, "user_search_base");
        let user_attribute = violations.require_text(self.user_attribute, "user_attribute");
        let enabled = violations.require(self.enabled, "enabled");

        if !violations.is_empty() {
            return Err(violations.into_error());
        }
        match (
            name,
            url,
            root,
            user_dn,
            password,
            user_search_base,
            user_attribute,
            enabled,
        ) {
            (
                Some(name),
                Some(url),
                Some(root),
                Some(user_dn),
                Some(password),
                Some(user_search_base),
                Some(user_attribute),
                Some(enabled),
            ) => Ok(LdapConfiguration::new(
                name,
                url,
                root,
                user_dn,
                password,
                user_search_base,
                user_attribute,
                enabled,
            )),
            _ => Err(Violations::new().into_error()),
        }
    }
}
