use core::fmt;

use upcast_kit::Record;

/// A backend that can hold JSON records keyed by `(schema_id, key)`.
///
/// The store does not interpret record contents beyond holding them —
/// versioning and migration are handled by
/// [`upcast-kit`](https://docs.rs/upcast-kit) through the helpers in
/// this crate.
pub trait DocumentStore {
    /// Error type for this backend.
    type Error: fmt::Debug + fmt::Display;

    /// Store a record under `(schema_id, key)`, replacing any prior one.
    fn put(&mut self, schema_id: &str, key: &str, record: Record) -> Result<(), Self::Error>;

    /// Retrieve a record by `(schema_id, key)`.
    /// Returns `None` if the key does not exist.
    fn get(&self, schema_id: &str, key: &str) -> Result<Option<Record>, Self::Error>;

    /// Remove a record. Removing an absent key is not an error.
    fn delete(&mut self, schema_id: &str, key: &str) -> Result<(), Self::Error>;

    /// Every key stored under `schema_id`.
    fn keys(&self, schema_id: &str) -> Result<Vec<String>, Self::Error>;
}
