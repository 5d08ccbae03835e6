//! Example CRM pack.
//!
//! One schema family, `crm.customer`, migrated across three versions:
//!
//! - **v1 → v2**: `customerId` becomes `customer_id`, a top-level
//!   `email` moves under `contact.email`, and `age` is coerced to an
//!   integer (soft failure — a bad value stays as-is with a warning).
//! - **v2 → v3**: `name` becomes `full_name`, the email moves again to
//!   `contact.primary.email`, and `contact.primary.verified` defaults
//!   to `false`.
//!
//! Both email moves use first-write-wins semantics: a value already at
//! the destination is kept and the move is skipped with a warning.

use upcast_kit::{casts, compile_ops, MigrationRegistry, OnCastError, Op, RegistryError, SharedStep};
use upcast_pack::{BasePack, Pack, SchemaSpec};

/// Schema id this pack owns.
pub const SCHEMA_ID: &str = "crm.customer";

/// Terminal version of the lineage.
pub const LATEST_VERSION: u32 = 3;

fn v1_to_v2() -> SharedStep {
    SharedStep::new(compile_ops(vec![
        Op::rename("customerId", "customer_id"),
        Op::move_to("email", "contact.email"),
        Op::cast("age", casts::to_int(), OnCastError::Warn),
    ]))
}

fn v2_to_v3() -> SharedStep {
    SharedStep::new(compile_ops(vec![
        Op::rename("name", "full_name"),
        Op::move_to("contact.email", "contact.primary.email"),
        Op::set_default("contact.primary.verified", false),
    ]))
}

/// Build the CRM pack.
#[must_use]
pub fn pack() -> BasePack {
    let mut pack = BasePack::new("example-crm");
    pack.add_schema(
        SchemaSpec::new(SCHEMA_ID, LATEST_VERSION)
            .with_min_supported(1)
            .with_description("Customer records for the example CRM"),
        vec![(1, 2, v1_to_v2()), (2, 3, v2_to_v3())],
    );
    pack
}

/// Register the CRM migrations and latest version into `registry`.
pub fn register(registry: &mut MigrationRegistry) -> Result<(), RegistryError> {
    pack().register(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use upcast_kit::{upcast_to_latest, Record, UpcastContext};

    fn registry() -> MigrationRegistry {
        let mut registry = MigrationRegistry::new();
        register(&mut registry).unwrap();
        registry
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().expect("test fixture is an object")
    }

    #[test]
    fn v1_customer_reaches_v3() {
        let input = record(json!({
            "schema_version": 1,
            "customerId": "c-17",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "age": "36",
        }));
        let mut ctx = UpcastContext::new();

        let out = upcast_to_latest(&input, SCHEMA_ID, &registry(), Some(&mut ctx)).unwrap();

        assert_eq!(
            out,
            record(json!({
                "schema_version": 3,
                "customer_id": "c-17",
                "full_name": "Ada Lovelace",
                "age": 36,
                "contact": {
                    "primary": {
                        "email": "ada@example.com",
                        "verified": false,
                    },
                },
            }))
        );
        assert_eq!(ctx.applied_steps, vec![(1, 2), (2, 3)]);
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn existing_contact_email_wins() {
        let input = record(json!({
            "schema_version": 1,
            "customerId": "c-1",
            "name": "Grace",
            "email": "new@example.com",
            "contact": {"email": "old@example.com"},
        }));
        let mut ctx = UpcastContext::new();

        let out = upcast_to_latest(&input, SCHEMA_ID, &registry(), Some(&mut ctx)).unwrap();

        // First write wins: the pre-existing contact.email survives.
        assert_eq!(
            out["contact"]["primary"]["email"],
            json!("old@example.com")
        );
        assert_eq!(ctx.warnings.len(), 1);
        assert!(ctx.warnings[0].contains("contact.email"));
    }

    #[test]
    fn bad_age_warns_and_keeps_original() {
        let input = record(json!({
            "schema_version": 1,
            "customerId": "c-2",
            "name": "Edsger",
            "age": "unknown",
        }));
        let mut ctx = UpcastContext::new();

        let out = upcast_to_latest(&input, SCHEMA_ID, &registry(), Some(&mut ctx)).unwrap();

        assert_eq!(out["age"], json!("unknown"));
        assert_eq!(ctx.warnings.len(), 1);
        assert!(ctx.warnings[0].contains("'age'"));
    }

    #[test]
    fn v2_customer_only_runs_the_last_step() {
        let input = record(json!({
            "schema_version": 2,
            "customer_id": "c-3",
            "name": "Barbara",
            "contact": {"email": "b@example.com"},
        }));
        let mut ctx = UpcastContext::new();

        let out = upcast_to_latest(&input, SCHEMA_ID, &registry(), Some(&mut ctx)).unwrap();

        assert_eq!(out["schema_version"], json!(3));
        assert_eq!(out["full_name"], json!("Barbara"));
        assert_eq!(ctx.applied_steps, vec![(2, 3)]);
    }

    #[test]
    fn pack_metadata() {
        let pack = pack();
        assert_eq!(pack.pack_id(), "example-crm");
        let specs = pack.schemas();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].schema_id, SCHEMA_ID);
        assert_eq!(specs[0].latest_version, LATEST_VERSION);
    }
}
