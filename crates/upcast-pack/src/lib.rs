//! Pack contract for upcast-kit.
//!
//! A *pack* bundles everything one team knows about its schema
//! families: the migration steps and the latest version for each. The
//! contract toward the core is deliberately narrow — a pack performs
//! zero or more `register_migration` calls and exactly the needed
//! `set_latest_version` calls against a [`MigrationRegistry`], and
//! nothing else.
//!
//! Most packs don't implement [`Pack`] by hand; they fill a
//! [`BasePack`] with [`SchemaSpec`]s and step lists.

use upcast_kit::{MigrationRegistry, RegistryError, SharedStep};

/// Description of one schema family a pack owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSpec {
    /// Schema id this spec describes.
    pub schema_id: String,
    /// Terminal version the pack migrates to.
    pub latest_version: u32,
    /// Oldest version the pack still carries steps for, if the pack
    /// wants to advertise one.
    pub min_supported_version: Option<u32>,
    /// Free-form description for reporting.
    pub description: Option<String>,
}

impl SchemaSpec {
    /// Spec with just a schema id and latest version.
    pub fn new(schema_id: impl Into<String>, latest_version: u32) -> Self {
        Self {
            schema_id: schema_id.into(),
            latest_version,
            min_supported_version: None,
            description: None,
        }
    }

    /// Advertise the oldest supported version.
    #[must_use]
    pub fn with_min_supported(mut self, version: u32) -> Self {
        self.min_supported_version = Some(version);
        self
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One migration a pack ships: `(from_version, to_version, step)`.
pub type PackMigration = (u32, u32, SharedStep);

/// A bundle of migrations for one or more schema families.
pub trait Pack {
    /// Stable identifier for reporting (e.g. `"example-crm"`).
    fn pack_id(&self) -> &str;

    /// The schema specs this pack owns.
    fn schemas(&self) -> Vec<SchemaSpec>;

    /// Register every migration and latest version into `registry`.
    fn register(&self, registry: &mut MigrationRegistry) -> Result<(), RegistryError>;
}

/// Register one spec and its migrations into `registry`.
pub fn register_schema(
    registry: &mut MigrationRegistry,
    spec: &SchemaSpec,
    migrations: &[PackMigration],
) -> Result<(), RegistryError> {
    registry.set_latest_version(spec.schema_id.clone(), spec.latest_version);
    for (from, to, step) in migrations {
        registry.register_migration(spec.schema_id.clone(), *from, *to, step.clone())?;
    }
    Ok(())
}

/// A ready-made [`Pack`] built from accumulated schema entries.
///
/// # Example
///
/// ```
/// use upcast_kit::{compile_ops, MigrationRegistry, Op, SharedStep};
/// use upcast_pack::{BasePack, Pack, SchemaSpec};
///
/// let mut pack = BasePack::new("example");
/// pack.add_schema(
///     SchemaSpec::new("crm.customer", 2),
///     vec![(1, 2, SharedStep::new(compile_ops(vec![Op::rename("name", "full_name")])))],
/// );
///
/// let mut registry = MigrationRegistry::new();
/// pack.register(&mut registry)?;
/// assert_eq!(registry.latest_version("crm.customer")?, 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct BasePack {
    pack_id: String,
    entries: Vec<(SchemaSpec, Vec<PackMigration>)>,
}

impl BasePack {
    /// Create an empty pack under `pack_id`.
    pub fn new(pack_id: impl Into<String>) -> Self {
        Self {
            pack_id: pack_id.into(),
            entries: Vec::new(),
        }
    }

    /// Add a schema family and its migrations.
    pub fn add_schema(&mut self, spec: SchemaSpec, migrations: Vec<PackMigration>) {
        self.entries.push((spec, migrations));
    }
}

impl Pack for BasePack {
    fn pack_id(&self) -> &str {
        &self.pack_id
    }

    fn schemas(&self) -> Vec<SchemaSpec> {
        self.entries.iter().map(|(spec, _)| spec.clone()).collect()
    }

    fn register(&self, registry: &mut MigrationRegistry) -> Result<(), RegistryError> {
        for (spec, migrations) in &self.entries {
            register_schema(registry, spec, migrations)?;
        }
        Ok(())
    }
}
