//! Session contract with the host application.
//!
//! The adapter never owns session storage; it writes the CAS attributes
//! through this trait so eligibility checks can read them back later.

use serde_json::Value;
use std::collections::HashMap;

use crate::attributes::CasAttributes;
use crate::error::{CasError, Result};

/// Session key holding the CAS attribute mapping.
pub const SESSION_ATTRIBUTES_KEY: &str = "attributes";

/// Per-request session storage implemented by the host.
pub trait SessionStore {
    /// Store a value under `key`, replacing any previous value.
    fn insert(&mut self, key: &str, value: Value) -> Result<()>;

    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<Value>;
}

/// Write the CAS attribute mapping into the session.
pub fn store_attributes<S: SessionStore + ?Sized>(
    session: &mut S,
    attributes: &CasAttributes,
) -> Result<()> {
    let value = serde_json::to_value(attributes)
        .map_err(|e| CasError::Session(format!("failed to serialize attributes: {}", e)))?;
    session.insert(SESSION_ATTRIBUTES_KEY, value)
}

/// Read the CAS attribute mapping back from the session, if present.
pub fn stored_attributes<S: SessionStore + ?Sized>(session: &S) -> Option<CasAttributes> {
    session
        .get(SESSION_ATTRIBUTES_KEY)
        .and_then(|value| serde_json::from_value(value).ok())
}

/// In-memory session, for hosts without their own store and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    values: HashMap<String, Value>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SessionStore for MemorySession {
    fn insert(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_roundtrip_through_session() {
        let mut attrs = CasAttributes::new();
        attrs.insert("uid", "alice");
        attrs.insert("tipoAcessoLogin", "2026");

        let mut session = MemorySession::new();
        store_attributes(&mut session, &attrs).unwrap();

        let stored = session.get(SESSION_ATTRIBUTES_KEY).unwrap();
        assert_eq!(stored["uid"], "alice");
        assert_eq!(stored_attributes(&session), Some(attrs));
    }

    #[test]
    fn test_empty_session() {
        let session = MemorySession::new();
        assert!(session.is_empty());
        assert_eq!(stored_attributes(&session), None);
    }
}
