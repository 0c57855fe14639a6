//! CAS attribute mapping returned by ticket validation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CasError, Result};

/// A CAS attribute is a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Single(String),
    Multiple(Vec<String>),
}

impl AttributeValue {
    /// First value of the attribute.
    pub fn first(&self) -> Option<&str> {
        match self {
            AttributeValue::Single(s) => Some(s.as_str()),
            AttributeValue::Multiple(v) => v.first().map(|s| s.as_str()),
        }
    }

    /// All values of the attribute.
    pub fn values(&self) -> Vec<&str> {
        match self {
            AttributeValue::Single(s) => vec![s.as_str()],
            AttributeValue::Multiple(v) => v.iter().map(|s| s.as_str()).collect(),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Single(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Single(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        AttributeValue::Multiple(values)
    }
}

/// Attributes released by the CAS server for a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CasAttributes(HashMap<String, AttributeValue>);

impl CasAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    /// Get a single-valued attribute. Multi-valued attributes yield their
    /// first value.
    pub fn get_single(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.first())
    }

    /// Get a single-valued attribute or fail with [`CasError::MissingAttribute`].
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get_single(name)
            .ok_or_else(|| CasError::MissingAttribute(name.to_string()))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, AttributeValue)> for CasAttributes {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_multi_valued() {
        let mut attrs = CasAttributes::new();
        attrs.insert("uid", "alice");
        attrs.insert(
            "groups",
            vec!["staff".to_string(), "students".to_string()],
        );

        assert_eq!(attrs.get_single("uid"), Some("alice"));
        assert_eq!(attrs.get_single("groups"), Some("staff")); // first value
        assert_eq!(attrs.get("groups").unwrap().values(), vec!["staff", "students"]);
        assert_eq!(attrs.get_single("missing"), None);
    }

    #[test]
    fn test_require_missing() {
        let attrs = CasAttributes::new();
        match attrs.require("personName") {
            Err(CasError::MissingAttribute(name)) => assert_eq!(name, "personName"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_json_shape() {
        let attrs: CasAttributes =
            serde_json::from_str(r#"{"uid": "alice", "memberOf": ["a", "b"]}"#).unwrap();
        assert_eq!(attrs.get_single("uid"), Some("alice"));
        assert_eq!(
            attrs.get("memberOf"),
            Some(&AttributeValue::Multiple(vec!["a".to_string(), "b".to_string()]))
        );
    }
}
