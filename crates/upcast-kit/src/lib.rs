//! # upcast-kit
//!
//! Linear schema-lineage upcasting for JSON records.
//!
//! When the shape of a record family evolves, stored records keep the
//! version they were written with. `upcast-kit` walks such a record
//! forward through a chain of registered migration steps — v1→v2,
//! v2→v3, and so on — until it reaches a target version, collecting
//! diagnostics along the way and never mutating the caller's input.
//!
//! ## How It Works
//!
//! 1. Every record carries an integer [`SCHEMA_VERSION_FIELD`] field.
//! 2. A pack describes each schema change as a list of declarative
//!    [`Op`]s and compiles them into a step with [`compile_ops`].
//! 3. Steps are registered per schema id in a [`MigrationRegistry`],
//!    together with a latest-version marker.
//! 4. [`upcast`] looks up and applies one step at a time, stamping
//!    [`SCHEMA_VERSION_FIELD`] after each, until the target is reached.
//!
//! ## Key Concepts
//!
//! - **Linear chain**: every step advances exactly one version. Gaps
//!   and downcasts are hard errors, never silently skipped.
//! - **Pure steps**: a step returns a new record; the input is left
//!   untouched.
//! - **Engine-stamped versions**: the engine overwrites the version
//!   field after every step, so a misbehaving step cannot corrupt the
//!   walk.
//! - **Diagnostics, not logs**: warnings and the applied-step trace
//!   come back through an [`UpcastContext`] owned by the caller.
//!
//! ## Quick Start
//!
//! ```
//! use serde_json::json;
//! use upcast_kit::{compile_ops, upcast_to_latest, MigrationRegistry, Op, Record};
//!
//! let mut registry = MigrationRegistry::new();
//! registry.register_migration(
//!     "crm.customer",
//!     1,
//!     2,
//!     compile_ops(vec![Op::rename("name", "full_name")]),
//! )?;
//! registry.set_latest_version("crm.customer", 2);
//!
//! let record: Record = serde_json::from_value(json!({
//!     "schema_version": 1,
//!     "name": "Ada",
//! }))?;
//!
//! let upcasted = upcast_to_latest(&record, "crm.customer", &registry, None)?;
//! assert_eq!(upcasted["schema_version"], json!(2));
//! assert_eq!(upcasted["full_name"], json!("Ada"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod context;
mod engine;
mod error;
mod export;
mod registry;
mod step;

pub mod ops;
pub mod path;

pub use context::UpcastContext;
pub use engine::{upcast, upcast_to_latest, upcast_with_observer, Target, SCHEMA_VERSION_FIELD};
pub use error::{RegistryError, UpcastError};
pub use export::{render_dot, RegistryExport};
pub use ops::{casts, compile_ops, Caster, CompiledOps, OnCastError, Op};
pub use path::Record;
pub use registry::{MigrationEdge, MigrationRegistry};
pub use step::{steps, SharedStep, Step};
