//! The upcast state machine.
//!
//! Walks a record from its current `schema_version` to a target
//! version, one registered step at a time. The engine — not the steps —
//! is authoritative for version stamping: after every step it
//! overwrites the version field, so the walk cannot be derailed by a
//! step that writes something else there.

use serde_json::Value;

use crate::context::UpcastContext;
use crate::error::UpcastError;
use crate::path::Record;
use crate::registry::MigrationRegistry;

/// Name of the required version field on every record.
pub const SCHEMA_VERSION_FIELD: &str = "schema_version";

/// Where an upcast should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The registry's latest-version marker for the schema id.
    Latest,
    /// An explicit version.
    Version(u32),
}

impl From<u32> for Target {
    fn from(version: u32) -> Self {
        Self::Version(version)
    }
}

/// Upcast `record` to `target`, threading diagnostics through `ctx`.
///
/// Returns a new record; the input is never mutated. When the record is
/// already at the target version, the result is a structurally equal
/// but distinct copy and no steps run.
///
/// # Errors
///
/// - [`UpcastError::MissingSchemaVersion`] / [`UpcastError::InvalidSchemaVersion`]
///   when the record's version field is absent or not a non-negative
///   integer (booleans are rejected).
/// - [`UpcastError::UnsupportedSchemaId`] when `Target::Latest` has no
///   marker, or an explicit target names a schema id with no registered
///   artifacts at all.
/// - [`UpcastError::NoMigrationPath`] on a chain gap or a requested
///   downcast.
/// - [`UpcastError::CastFailure`] propagated from a step.
pub fn upcast(
    record: &Record,
    schema_id: &str,
    registry: &MigrationRegistry,
    target: Target,
    ctx: Option<&mut UpcastContext>,
) -> Result<Record, UpcastError> {
    upcast_inner(record, schema_id, registry, target, ctx, None)
}

/// [`upcast`] with a per-step observer.
///
/// The observer is invoked once per applied edge as
/// `(schema_id, from_version, to_version)`, strictly in traversal
/// order.
pub fn upcast_with_observer(
    record: &Record,
    schema_id: &str,
    registry: &MigrationRegistry,
    target: Target,
    ctx: Option<&mut UpcastContext>,
    mut on_step: impl FnMut(&str, u32, u32),
) -> Result<Record, UpcastError> {
    upcast_inner(record, schema_id, registry, target, ctx, Some(&mut on_step))
}

/// Upcast `record` to the latest version registered for `schema_id`.
pub fn upcast_to_latest(
    record: &Record,
    schema_id: &str,
    registry: &MigrationRegistry,
    ctx: Option<&mut UpcastContext>,
) -> Result<Record, UpcastError> {
    upcast(record, schema_id, registry, Target::Latest, ctx)
}

fn upcast_inner(
    record: &Record,
    schema_id: &str,
    registry: &MigrationRegistry,
    target: Target,
    mut ctx: Option<&mut UpcastContext>,
    mut on_step: Option<&mut dyn FnMut(&str, u32, u32)>,
) -> Result<Record, UpcastError> {
    let from_version = record_version(record)?;

    let target_version = match target {
        Target::Latest => registry.latest_version(schema_id)?,
        Target::Version(version) => {
            if !registry.has_schema(schema_id) {
                return Err(UpcastError::UnsupportedSchemaId {
                    schema_id: schema_id.to_string(),
                });
            }
            version
        }
    };

    if from_version == target_version {
        return Ok(record.clone());
    }
    if from_version > target_version {
        return Err(UpcastError::NoMigrationPath {
            schema_id: schema_id.to_string(),
            from_version,
            to_version: target_version,
        });
    }

    let mut current_version = from_version;
    let mut current = record.clone();
    while current_version < target_version {
        let next_version = current_version + 1;
        let step = registry.step_for(schema_id, current_version).ok_or_else(|| {
            UpcastError::NoMigrationPath {
                schema_id: schema_id.to_string(),
                from_version: current_version,
                to_version: next_version,
            }
        })?;

        current = step.apply(&current, ctx.as_deref_mut())?;
        // The engine owns the version field, whatever the step wrote.
        current.insert(SCHEMA_VERSION_FIELD.to_string(), Value::from(next_version));

        if let Some(ctx) = ctx.as_deref_mut() {
            ctx.applied_steps.push((current_version, next_version));
        }
        if let Some(on_step) = on_step.as_deref_mut() {
            on_step(schema_id, current_version, next_version);
        }
        current_version = next_version;
    }

    Ok(current)
}

fn record_version(record: &Record) -> Result<u32, UpcastError> {
    let value = record
        .get(SCHEMA_VERSION_FIELD)
        .ok_or(UpcastError::MissingSchemaVersion)?;
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| invalid_version(value)),
        // Booleans are integer-like in some type systems; not here.
        other => Err(invalid_version(other)),
    }
}

fn invalid_version(value: &Value) -> UpcastError {
    UpcastError::InvalidSchemaVersion {
        found: value.to_string(),
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
    fn version_field_must_exist() {
        let registry = MigrationRegistry::new();
        let err = upcast(
            &record(json!({"name": "Ada"})),
            "s",
            &registry,
            Target::Version(2),
            None,
        )
        .unwrap_err();
        assert_eq!(err, UpcastError::MissingSchemaVersion);
    }

    #[test]
    fn boolean_version_is_invalid() {
        let registry = MigrationRegistry::new();
        let err = upcast(
            &record(json!({"schema_version": true})),
            "s",
            &registry,
            Target::Version(2),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            UpcastError::InvalidSchemaVersion {
                found: "true".to_string()
            }
        );
    }

    #[test]
    fn negative_and_fractional_versions_are_invalid() {
        let registry = MigrationRegistry::new();
        for bad in [json!(-1), json!(1.5), json!("2")] {
            let err = upcast(
                &record(json!({"schema_version": bad})),
                "s",
                &registry,
                Target::Version(2),
                None,
            )
            .unwrap_err();
            assert!(matches!(err, UpcastError::InvalidSchemaVersion { .. }));
        }
    }

    #[test]
    fn explicit_target_requires_a_known_schema() {
        let registry = MigrationRegistry::new();
        let err = upcast(
            &record(json!({"schema_version": 1})),
            "ghost",
            &registry,
            Target::Version(1),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            UpcastError::UnsupportedSchemaId {
                schema_id: "ghost".to_string()
            }
        );
    }

    #[test]
    fn target_from_u32() {
        assert_eq!(Target::from(3), Target::Version(3));
    }
}
