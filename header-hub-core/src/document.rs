//! Capability traits for persisted documents
//!
//! Instead of a base-class hierarchy, every persisted entity implements
//! [`Document`] and pairs with a [`Criteria`] type describing its
//! find-by-example predicates. The storage backends are written once against
//! these traits.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Debug;

/// A persisted configuration document.
pub trait Document:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Type label, used as the document-type discriminator in storage and
    /// as the `document_type` of audit entries.
    const TYPE_NAME: &'static str;

    /// The find-by-example criteria for this document type.
    type Criteria: Criteria;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn created_at(&self) -> DateTime<Utc>;
    fn set_created_at(&mut self, at: DateTime<Utc>);

    /// Stamp the last-modified timestamp. Append-only documents ignore it.
    fn touch(&mut self, at: DateTime<Utc>);

    /// The unique index this document participates in, if any.
    fn unique_key(&self) -> Option<UniqueKey>;
}

/// A unique-index key: the index name plus the indexed field values.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueKey {
    pub index: &'static str,
    pub fields: Vec<(&'static str, Value)>,
}

/// How a predicate compares a document field against the example value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Equals,
    Contains,
}

/// One find-by-example predicate over a top-level document field.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub field: &'static str,
    pub matcher: Matcher,
    pub value: Value,
}

impl Predicate {
    pub fn equals(field: &'static str, value: impl Into<Value>) -> Self {
        Self {
            field,
            matcher: Matcher::Equals,
            value: value.into(),
        }
    }

    pub fn contains(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            matcher: Matcher::Contains,
            value: Value::String(value.into()),
        }
    }

    /// Apply this predicate to a document serialized as a JSON object.
    pub fn matches(&self, document: &Value) -> bool {
        let field = document.get(self.field);
        match self.matcher {
            Matcher::Equals => field == Some(&self.value),
            Matcher::Contains => match (field.and_then(Value::as_str), self.value.as_str()) {
                (Some(haystack), Some(needle)) => haystack.contains(needle),
                _ => false,
            },
        }
    }
}

/// Search criteria that desugar to a list of predicates. Fields left unset
/// produce no predicate, matching everything.
pub trait Criteria: Send + Sync {
    fn predicates(&self) -> Vec<Predicate>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contains_predicate_matches_substring() {
        let doc = json!({"name": "billing-gateway"});
        assert!(Predicate::contains("name", "gateway").matches(&doc));
        assert!(!Predicate::contains("name", "ledger").matches(&doc));
    }

    #[test]
    fn equals_predicate_compares_full_value() {
        let doc = json!({"enabled": true, "module_id": "m-1"});
        assert!(Predicate::equals("enabled", true).matches(&doc));
        assert!(!Predicate::equals("enabled", false).matches(&doc));
        assert!(Predicate::equals("module_id", "m-1").matches(&doc));
    }

    #[test]
    fn missing_field_never_matches() {
        let doc = json!({"name": "x"});
        assert!(!Predicate::contains("description", "x").matches(&doc));
        assert!(!Predicate::equals("enabled", true).matches(&doc));
    }
}
