use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::composer::ComposeContext;

/// Recursively merge `patch` into a copy of `base`.
///
/// Nested objects merge key by key; everything else is replaced. When
/// `overwrite` is false a colliding non-object key keeps the base value
/// and a warning is recorded.
pub fn deep_merge(
    base: &Map<String, Value>,
    patch: &Map<String, Value>,
    overwrite: bool,
    mut ctx: Option<&mut ComposeContext>,
) -> Map<String, Value> {
    let mut result = base.clone();
    for (key, value) in patch {
        match (result.get(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                let merged = deep_merge(existing, incoming, overwrite, ctx.as_deref_mut());
                result.insert(key.clone(), Value::Object(merged));
            }
            (Some(_), _) if !overwrite => {
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.warn(format!("deep_merge skipped key '{key}'; overwrite is disabled"));
                }
            }
            _ => {
                result.insert(key.clone(), value.clone());
            }
        }
    }
    result
}

/// Merge two lists of objects, matching items by the value at `key`.
///
/// Matching items deep-merge; unmatched patch items append. Items
/// missing the key cannot be matched — they are appended as-is and a
/// warning is recorded. Items are indexed by the canonical JSON
/// rendering of their key value.
pub fn merge_arrays_by_key(
    base: &[Map<String, Value>],
    patch: &[Map<String, Value>],
    key: &str,
    overwrite: bool,
    mut ctx: Option<&mut ComposeContext>,
) -> Vec<Map<String, Value>> {
    let mut result: Vec<Map<String, Value>> = base.to_vec();
    let mut index_by_key: BTreeMap<String, usize> = BTreeMap::new();

    for (idx, item) in result.iter().enumerate() {
        match item.get(key) {
            Some(value) => {
                index_by_key.insert(value.to_string(), idx);
            }
            None => {
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.warn(format!("merge_arrays_by_key: base item missing key '{key}'"));
                }
            }
        }
    }

    for item in patch {
        let item_key = match item.get(key) {
            Some(value) => value.to_string(),
            None => {
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.warn(format!("merge_arrays_by_key: patch item missing key '{key}'"));
                }
                result.push(item.clone());
                continue;
            }
        };
        match index_by_key.get(&item_key) {
            Some(&idx) => {
                let merged = deep_merge(&result[idx], item, overwrite, ctx.as_deref_mut());
                result[idx] = merged;
            }
            None => {
                index_by_key.insert(item_key, result.len());
                result.push(item.clone());
            }
        }
    }

    result
}
