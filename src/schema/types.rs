//! Schema definition entity
//!
//! A schema definition is an immutable JSON tree using the Avro keys
//! `type`, `name`, `namespace`, `fields`, `items`, `values`, `symbols`,
//! `size` and `default`. It is stored and handed to the codec untouched.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Computes the qualified name of a named type.
///
/// `namespace + "_" + name` when a non-empty namespace is present,
/// otherwise `name` alone.
pub fn qualified_name(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}_{}", ns, name),
        _ => name.to_string(),
    }
}

/// SHA-256 over the compact JSON serialization of a definition, hex encoded.
pub fn fingerprint(definition: &Value) -> String {
    format!("{:x}", Sha256::digest(definition.to_string().as_bytes()))
}

/// A schema definition registered under (id, version).
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSchema {
    /// Schema identifier
    pub schema_id: String,
    /// Schema version
    pub schema_version: u32,
    /// Raw definition tree
    pub definition: Value,
}

impl StoredSchema {
    /// Create a new stored schema
    pub fn new(schema_id: impl Into<String>, definition: Value, schema_version: u32) -> Self {
        Self {
            schema_id: schema_id.into(),
            schema_version,
            definition,
        }
    }

    /// Returns the unique key for this schema (id, version)
    pub fn key(&self) -> (&str, u32) {
        (&self.schema_id, self.schema_version)
    }

    /// Returns the definition fingerprint
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_qualified_name_with_namespace() {
        assert_eq!(qualified_name(Some("com.example"), "User"), "com.example_User");
    }

    #[test]
    fn test_qualified_name_without_namespace() {
        assert_eq!(qualified_name(None, "User"), "User");
        assert_eq!(qualified_name(Some(""), "User"), "User");
    }

    #[test]
    fn test_stored_schema_equality() {
        let a = StoredSchema::new("test", json!({"type": "record", "name": "test", "fields": []}), 1);
        let b = StoredSchema::new("test", json!({"type": "record", "name": "test", "fields": []}), 1);
        let c = StoredSchema::new("test", json!({"type": "record", "name": "test", "fields": []}), 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.key(), ("test", 1));
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let def = json!({"type": "enum", "name": "Status", "symbols": ["A", "B"]});
        let fp = fingerprint(&def);
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, fingerprint(&def.clone()));
        assert_ne!(fp, fingerprint(&json!("string")));
    }
}
