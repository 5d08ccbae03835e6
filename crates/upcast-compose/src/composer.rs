use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::merge::deep_merge;

/// One independently produced piece of a root document.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Schema family the fragment belongs to.
    pub schema_id: String,
    /// The fragment's payload.
    pub payload: Map<String, Value>,
    /// When the fragment was produced, for freshness resolution.
    pub updated_at: Option<DateTime<Utc>>,
    /// Producer identifier, for reporting.
    pub source: Option<String>,
}

impl Fragment {
    /// Fragment with just a schema id and payload.
    pub fn new(schema_id: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            schema_id: schema_id.into(),
            payload,
            updated_at: None,
            source: None,
        }
    }

    /// Attach a production timestamp.
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Attach a producer identifier.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Diagnostics collector for one composition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeContext {
    /// Warnings collected while merging.
    pub warnings: Vec<String>,
    /// Free-form notes.
    pub notes: BTreeMap<String, Value>,
    /// Ordered `merged:<schema_id>` markers, one per fragment.
    pub applied: Vec<String>,
}

impl ComposeContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// How fragment payloads are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Recursive key-by-key object merge.
    DeepMerge,
}

/// Pick the fresher of two fragments by `updated_at`.
///
/// A fragment with a timestamp beats one without. On equal timestamps
/// the base side is kept; when neither carries one, the patch side
/// wins.
#[must_use]
pub fn choose_newer<'a>(base: &'a Fragment, patch: &'a Fragment) -> &'a Fragment {
    match (base.updated_at, patch.updated_at) {
        (Some(b), Some(p)) => {
            if p > b {
                patch
            } else {
                base
            }
        }
        (Some(_), None) => base,
        _ => patch,
    }
}

/// Compose fragments into one root document.
///
/// The root carries the given `root_schema_id`, `schema_version: 1`,
/// every payload deep-merged in fragment order, and a `components` map
/// of the chosen payload per schema family. Duplicate fragments for the
/// same family resolve to the fresher one with a warning.
pub fn compose_root(
    fragments: &[Fragment],
    root_schema_id: &str,
    strategy: MergeStrategy,
    mut ctx: Option<&mut ComposeContext>,
) -> Map<String, Value> {
    match strategy {
        MergeStrategy::DeepMerge => {}
    }

    let mut root = Map::new();
    root.insert("schema_id".to_string(), Value::from(root_schema_id));
    root.insert("schema_version".to_string(), Value::from(1));

    let mut components: BTreeMap<String, Fragment> = BTreeMap::new();
    for fragment in fragments {
        match components.get(fragment.schema_id.as_str()) {
            Some(existing) => {
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.warn(format!(
                        "duplicate fragment for '{}'; choosing the newer one",
                        fragment.schema_id
                    ));
                }
                let chosen = choose_newer(existing, fragment).clone();
                components.insert(fragment.schema_id.clone(), chosen);
            }
            None => {
                components.insert(fragment.schema_id.clone(), fragment.clone());
            }
        }

        root = deep_merge(&root, &fragment.payload, true, ctx.as_deref_mut());
        if let Some(ctx) = ctx.as_deref_mut() {
            ctx.applied.push(format!("merged:{}", fragment.schema_id));
        }
    }

    let component_payloads: Map<String, Value> = components
        .into_iter()
        .map(|(schema_id, fragment)| (schema_id, Value::Object(fragment.payload)))
        .collect();
    root.insert("components".to_string(), Value::Object(component_payloads));
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("test fixture is an object")
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    #[test]
    fn compose_merges_payloads_and_records_components() {
        let fragments = vec![
            Fragment::new("crm.customer", obj(json!({"customer": {"name": "Ada"}}))),
            Fragment::new("billing.invoice", obj(json!({"invoice": {"total": 10}}))),
        ];
        let mut ctx = ComposeContext::new();

        let root = compose_root(&fragments, "crm.root", MergeStrategy::DeepMerge, Some(&mut ctx));

        assert_eq!(root["schema_id"], json!("crm.root"));
        assert_eq!(root["schema_version"], json!(1));
        assert_eq!(root["customer"]["name"], json!("Ada"));
        assert_eq!(root["invoice"]["total"], json!(10));
        assert_eq!(
            root["components"]["crm.customer"],
            json!({"customer": {"name": "Ada"}})
        );
        assert_eq!(
            ctx.applied,
            vec!["merged:crm.customer", "merged:billing.invoice"]
        );
    }

    #[test]
    fn duplicate_fragments_resolve_to_the_newer() {
        let fragments = vec![
            Fragment::new("crm.customer", obj(json!({"v": "old"}))).with_updated_at(at(100)),
            Fragment::new("crm.customer", obj(json!({"v": "new"}))).with_updated_at(at(200)),
        ];
        let mut ctx = ComposeContext::new();

        let root = compose_root(&fragments, "crm.root", MergeStrategy::DeepMerge, Some(&mut ctx));

        assert_eq!(root["components"]["crm.customer"], json!({"v": "new"}));
        assert_eq!(ctx.warnings.len(), 1);
        assert!(ctx.warnings[0].contains("crm.customer"));
    }

    #[test]
    fn older_duplicate_does_not_replace_newer() {
        let fragments = vec![
            Fragment::new("crm.customer", obj(json!({"v": "new"}))).with_updated_at(at(200)),
            Fragment::new("crm.customer", obj(json!({"v": "old"}))).with_updated_at(at(100)),
        ];

        let root = compose_root(&fragments, "crm.root", MergeStrategy::DeepMerge, None);

        assert_eq!(root["components"]["crm.customer"], json!({"v": "new"}));
    }

    #[test]
    fn choose_newer_prefers_timestamps() {
        let old = Fragment::new("s", obj(json!({}))).with_updated_at(at(1));
        let new = Fragment::new("s", obj(json!({}))).with_updated_at(at(2));
        let untimed = Fragment::new("s", obj(json!({})));

        assert_eq!(choose_newer(&old, &new).updated_at, new.updated_at);
        assert_eq!(choose_newer(&new, &old).updated_at, new.updated_at);
        // A timestamped base beats an untimed patch; otherwise patch wins.
        assert!(choose_newer(&new, &untimed).updated_at.is_some());
        assert!(choose_newer(&untimed, &old).updated_at.is_some());
        assert!(choose_newer(&untimed, &untimed.clone()).updated_at.is_none());
    }
}
