use core::fmt;
use std::collections::BTreeMap;

use upcast_kit::Record;

use crate::traits::DocumentStore;

/// In-memory storage backend.
///
/// Records live in a `BTreeMap` — nothing touches disk. Ideal for
/// tests and prototyping.
///
/// # Example
///
/// ```
/// use upcast_store::{DocumentStore, MemoryStore};
/// use upcast_kit::Record;
///
/// let mut store = MemoryStore::new();
/// let mut record = Record::new();
/// record.insert("schema_version".into(), 1.into());
/// store.put("crm.customer", "c-1", record).unwrap();
///
/// assert!(store.get("crm.customer", "c-1").unwrap().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<(String, String), Record>,
}

/// Error type for the in-memory backend.
///
/// This backend never actually fails, but the trait requires an error
/// type.
#[derive(Debug, Clone)]
pub struct MemoryError(String);

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryStore error: {}", self.0)
    }
}

impl std::error::Error for MemoryError {}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all schema families.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn full_key(schema_id: &str, key: &str) -> (String, String) {
        (schema_id.to_string(), key.to_string())
    }
}

impl DocumentStore for MemoryStore {
    type Error = MemoryError;

    fn put(&mut self, schema_id: &str, key: &str, record: Record) -> Result<(), Self::Error> {
        self.records.insert(Self::full_key(schema_id, key), record);
        Ok(())
    }

    fn get(&self, schema_id: &str, key: &str) -> Result<Option<Record>, Self::Error> {
        Ok(self.records.get(&Self::full_key(schema_id, key)).cloned())
    }

    fn delete(&mut self, schema_id: &str, key: &str) -> Result<(), Self::Error> {
        self.records.remove(&Self::full_key(schema_id, key));
        Ok(())
    }

    fn keys(&self, schema_id: &str) -> Result<Vec<String>, Self::Error> {
        let keys = self
            .records
            .keys()
            .filter(|(sid, _)| sid == schema_id)
            .map(|(_, key)| key.clone())
            .collect();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().expect("test fixture is an object")
    }

    #[test]
    fn put_get_roundtrip() {
        let mut store = MemoryStore::new();
        store
            .put("s", "k", record(json!({"schema_version": 1})))
            .unwrap();
        assert_eq!(
            store.get("s", "k").unwrap(),
            Some(record(json!({"schema_version": 1})))
        );
    }

    #[test]
    fn get_absent_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("s", "missing").unwrap(), None);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut store = MemoryStore::new();
        store.put("s", "k", Record::new()).unwrap();
        store.delete("s", "k").unwrap();
        store.delete("s", "k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn keys_are_scoped_by_schema_id() {
        let mut store = MemoryStore::new();
        store.put("a", "k1", Record::new()).unwrap();
        store.put("a", "k2", Record::new()).unwrap();
        store.put("b", "k3", Record::new()).unwrap();

        assert_eq!(store.keys("a").unwrap(), vec!["k1", "k2"]);
        assert_eq!(store.keys("b").unwrap(), vec!["k3"]);
        assert!(store.keys("c").unwrap().is_empty());
    }
}
