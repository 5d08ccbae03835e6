use core::fmt;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{RegistryError, UpcastError};
use crate::step::Step;

/// One registered edge in a schema's migration chain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MigrationEdge {
    /// Schema family the edge belongs to.
    pub schema_id: String,
    /// Source version.
    pub from_version: u32,
    /// Target version (always `from_version + 1`).
    pub to_version: u32,
}

/// Registry of linear migration chains and latest-version markers.
///
/// For each schema id the registry holds at most one step per
/// `from_version` and one latest-version marker. Every edge satisfies
/// `to_version == from_version + 1`, so a schema's migrations can only
/// ever form a single linear chain — never branches or skips.
///
/// A registry is built once, early, by packs calling
/// [`register_migration`](Self::register_migration) and
/// [`set_latest_version`](Self::set_latest_version), then treated as
/// read-only for the rest of the process. Concurrent reads are fine;
/// mutating while upcasts are running is not supported.
///
/// # Example
///
/// ```
/// use upcast_kit::{steps, MigrationRegistry, Record};
///
/// let mut registry = MigrationRegistry::new();
/// registry.register_migration("crm.customer", 1, 2, steps::from_fn(|r: &Record| r.clone()))?;
/// registry.set_latest_version("crm.customer", 2);
///
/// assert_eq!(registry.latest_version("crm.customer")?, 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<String, BTreeMap<u32, Box<dyn Step>>>,
    latest_versions: BTreeMap<String, u32>,
}

impl MigrationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sequential migration step (`vN` → `vN+1`).
    ///
    /// Re-registering the same `(schema_id, from_version)` silently
    /// replaces the prior step — last registration wins.
    pub fn register_migration(
        &mut self,
        schema_id: impl Into<String>,
        from_version: u32,
        to_version: u32,
        step: impl Step + 'static,
    ) -> Result<(), RegistryError> {
        if from_version.checked_add(1) != Some(to_version) {
            return Err(RegistryError::NonSequentialStep {
                from: from_version,
                to: to_version,
            });
        }
        self.migrations
            .entry(schema_id.into())
            .or_default()
            .insert(from_version, Box::new(step));
        Ok(())
    }

    /// Record the terminal version for a schema id. Independent of
    /// which steps are registered.
    pub fn set_latest_version(&mut self, schema_id: impl Into<String>, version: u32) {
        self.latest_versions.insert(schema_id.into(), version);
    }

    /// The latest version registered for `schema_id`.
    pub fn latest_version(&self, schema_id: &str) -> Result<u32, UpcastError> {
        self.latest_versions
            .get(schema_id)
            .copied()
            .ok_or_else(|| UpcastError::UnsupportedSchemaId {
                schema_id: schema_id.to_string(),
            })
    }

    /// Every known schema id, sorted ascending.
    #[must_use]
    pub fn schema_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .latest_versions
            .keys()
            .chain(self.migrations.keys())
            .cloned()
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// All latest-version markers.
    #[must_use]
    pub fn latest_versions(&self) -> BTreeMap<String, u32> {
        self.latest_versions.clone()
    }

    /// Every registered edge, sorted by schema id then from-version.
    ///
    /// The ordering is independent of registration order, so the
    /// listing is safe to feed into reproducible reports.
    #[must_use]
    pub fn list_migrations(&self) -> Vec<MigrationEdge> {
        self.migrations
            .iter()
            .flat_map(|(schema_id, steps)| {
                steps.keys().map(move |from| MigrationEdge {
                    schema_id: schema_id.clone(),
                    from_version: *from,
                    to_version: *from + 1,
                })
            })
            .collect()
    }

    /// Lookup used by the upcast engine. Deliberately not public:
    /// callers go through the registration and introspection surface.
    pub(crate) fn step_for(&self, schema_id: &str, from_version: u32) -> Option<&dyn Step> {
        self.migrations
            .get(schema_id)
            .and_then(|steps| steps.get(&from_version))
            .map(|step| step.as_ref())
    }

    /// Whether any artifact (a step or a latest-version marker) exists
    /// for `schema_id`.
    pub(crate) fn has_schema(&self, schema_id: &str) -> bool {
        self.latest_versions.contains_key(schema_id) || self.migrations.contains_key(schema_id)
    }
}

impl fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("schema_ids", &self.schema_ids())
            .field("edges", &self.list_migrations().len())
            .finish()
    }
}
