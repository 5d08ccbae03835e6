use std::collections::BTreeMap;

use serde::Serialize;

use crate::registry::{MigrationEdge, MigrationRegistry};

/// A deterministic snapshot of a registry's contents.
///
/// Schema ids and edges are sorted, so exporting the same registrations
/// in any insertion order yields an identical structure — reporting
/// tools can diff two exports byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryExport {
    /// Every known schema id, sorted ascending.
    pub schema_ids: Vec<String>,
    /// Latest-version marker per schema id.
    pub latest_versions: BTreeMap<String, u32>,
    /// Every registered edge, sorted by schema id then from-version.
    pub migrations: Vec<MigrationEdge>,
}

impl MigrationRegistry {
    /// Snapshot the registry for reporting.
    #[must_use]
    pub fn export(&self) -> RegistryExport {
        RegistryExport {
            schema_ids: self.schema_ids(),
            latest_versions: self.latest_versions(),
            migrations: self.list_migrations(),
        }
    }
}

impl RegistryExport {
    /// Render the edges as a Graphviz digraph.
    #[must_use]
    pub fn to_dot(&self) -> String {
        render_dot(&self.migrations)
    }
}

/// Render edges as a Graphviz digraph, one `"id:vN" -> "id:vN+1";` line
/// per edge.
#[must_use]
pub fn render_dot(edges: &[MigrationEdge]) -> String {
    let mut lines = Vec::with_capacity(edges.len() + 2);
    lines.push("digraph migrations {".to_string());
    for edge in edges {
        lines.push(format!(
            "  \"{0}:v{1}\" -> \"{0}:v{2}\";",
            edge.schema_id, edge.from_version, edge.to_version
        ));
    }
    lines.push("}".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::steps;
    use crate::Record;

    fn identity() -> impl crate::Step {
        steps::from_fn(|r: &Record| r.clone())
    }

    #[test]
    fn export_is_deterministic_across_registration_order() {
        let mut a = MigrationRegistry::new();
        a.register_migration("crm.customer", 1, 2, identity()).unwrap();
        a.register_migration("billing.invoice", 1, 2, identity()).unwrap();
        a.set_latest_version("crm.customer", 2);
        a.set_latest_version("billing.invoice", 2);

        let mut b = MigrationRegistry::new();
        b.set_latest_version("billing.invoice", 2);
        b.register_migration("billing.invoice", 1, 2, identity()).unwrap();
        b.set_latest_version("crm.customer", 2);
        b.register_migration("crm.customer", 1, 2, identity()).unwrap();

        assert_eq!(a.export(), b.export());
        assert_eq!(
            serde_json::to_string(&a.export()).unwrap(),
            serde_json::to_string(&b.export()).unwrap()
        );
    }

    #[test]
    fn dot_renders_one_line_per_edge() {
        let mut registry = MigrationRegistry::new();
        registry.register_migration("crm.customer", 1, 2, identity()).unwrap();
        registry.register_migration("crm.customer", 2, 3, identity()).unwrap();

        let dot = registry.export().to_dot();
        assert!(dot.starts_with("digraph migrations {"));
        assert!(dot.contains("  \"crm.customer:v1\" -> \"crm.customer:v2\";"));
        assert!(dot.contains("  \"crm.customer:v2\" -> \"crm.customer:v3\";"));
        assert!(dot.ends_with('}'));
    }

    #[test]
    fn empty_registry_exports_empty_graph() {
        let registry = MigrationRegistry::new();
        let export = registry.export();
        assert!(export.schema_ids.is_empty());
        assert_eq!(export.to_dot(), "digraph migrations {\n}");
    }
}
