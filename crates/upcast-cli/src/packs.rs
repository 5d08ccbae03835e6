//! Built-in pack resolution.
//!
//! Migrations are compiled into the binary; `--pack NAME` and the
//! `UPCAST_PACKS` environment variable select which of the built-in
//! packs to register.

use upcast_kit::MigrationRegistry;
use upcast_pack::Pack;

/// Environment variable holding a comma-separated pack list.
pub const PACKS_ENV: &str = "UPCAST_PACKS";

/// Summary of one registered pack, for the export payload.
#[derive(Debug)]
pub struct LoadedPack {
    /// Name the pack was requested under.
    pub name: String,
    /// The pack's own identifier.
    pub pack_id: String,
    /// Schema ids the pack owns, sorted.
    pub schema_ids: Vec<String>,
}

fn builtin_pack(name: &str) -> Option<Box<dyn Pack>> {
    match name {
        "example-crm" => Some(Box::new(upcast_example_crm::pack())),
        _ => None,
    }
}

/// Combine the environment list and repeated `--pack` flags into one
/// deduplicated, order-preserving name list. Environment entries come
/// first, matching how deployments pin a default pack set.
pub fn merge_pack_names(env_value: &str, flags: &[String]) -> Vec<String> {
    let mut ordered = Vec::new();
    let candidates = env_value
        .split(',')
        .map(str::to_string)
        .chain(flags.iter().flat_map(|flag| flag.split(',').map(str::to_string)));
    for candidate in candidates {
        let name = candidate.trim();
        if name.is_empty() || ordered.iter().any(|seen: &String| seen == name) {
            continue;
        }
        ordered.push(name.to_string());
    }
    ordered
}

/// Resolve pack names from `--pack` flags plus `UPCAST_PACKS`.
pub fn resolve_pack_names(flags: &[String]) -> Vec<String> {
    let env_value = std::env::var(PACKS_ENV).unwrap_or_default();
    merge_pack_names(&env_value, flags)
}

/// Register every named pack into `registry`.
///
/// Fails with a `(code, message)` pair suited to the error envelope:
/// unknown names are `unknown_pack`, registration failures are
/// `pack_load_failed`.
pub fn load_packs(
    registry: &mut MigrationRegistry,
    names: &[String],
) -> Result<Vec<LoadedPack>, (&'static str, String)> {
    let mut loaded = Vec::with_capacity(names.len());
    for name in names {
        let pack = builtin_pack(name)
            .ok_or_else(|| ("unknown_pack", format!("unknown pack '{name}'")))?;
        pack.register(registry)
            .map_err(|e| ("pack_load_failed", format!("failed to load pack '{name}': {e}")))?;

        let mut schema_ids: Vec<String> = pack
            .schemas()
            .into_iter()
            .map(|spec| spec.schema_id)
            .collect();
        schema_ids.sort();
        schema_ids.dedup();

        loaded.push(LoadedPack {
            name: name.clone(),
            pack_id: pack.pack_id().to_string(),
            schema_ids,
        });
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_env_order_and_deduplicates() {
        let flags = vec!["b".to_string(), "a,c".to_string(), "b".to_string()];
        assert_eq!(merge_pack_names("a, b", &flags), vec!["a", "b", "c"]);
    }

    #[test]
    fn merge_with_no_sources_is_empty() {
        assert!(merge_pack_names("", &[]).is_empty());
    }

    #[test]
    fn load_known_pack() {
        let mut registry = MigrationRegistry::new();
        let loaded = load_packs(&mut registry, &["example-crm".to_string()]).unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].pack_id, "example-crm");
        assert_eq!(loaded[0].schema_ids, vec!["crm.customer"]);
        assert!(registry.latest_version("crm.customer").is_ok());
    }

    #[test]
    fn unknown_pack_is_an_error() {
        let mut registry = MigrationRegistry::new();
        let (code, message) = load_packs(&mut registry, &["nope".to_string()]).unwrap_err();
        assert_eq!(code, "unknown_pack");
        assert!(message.contains("nope"));
    }
}
