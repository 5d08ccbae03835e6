//! Dotted-path access into nested JSON objects.
//!
//! Paths are dot-separated literal segments (`"contact.primary.email"`).
//! There is no escaping and no array indexing — arrays are opaque leaf
//! values. All three accessors are pure: [`set_path`] and [`delete_path`]
//! return a fresh record and leave the input untouched.

use serde_json::{Map, Value};

/// A JSON record under migration: a mapping from string keys to values.
pub type Record = Map<String, Value>;

/// Look up the value at `path`.
///
/// Returns `None` when any segment is missing or an intermediate value
/// is not an object. A stored JSON `null` is present — it comes back as
/// `Some(&Value::Null)`, distinct from an absent path.
pub fn get_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Return a copy of `record` with `value` written at `path`.
///
/// Missing intermediate objects are created. An intermediate segment
/// that currently holds a non-object value is replaced with a fresh
/// empty object — migrations reshape structure, they do not merely
/// detect mismatches.
pub fn set_path(record: &Record, path: &str, value: Value) -> Record {
    let segments: Vec<&str> = path.split('.').collect();
    let mut updated = record.clone();
    let (leaf, intermediates) = match segments.split_last() {
        Some(pair) => pair,
        None => return updated,
    };

    let mut current = &mut updated;
    for segment in intermediates {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => unreachable!("slot was coerced to an object above"),
        };
    }
    current.insert((*leaf).to_string(), value);
    updated
}

/// Return a copy of `record` with the leaf at `path` removed.
///
/// If the leaf is absent, or any intermediate segment is not an object,
/// the copy is returned unchanged — a silent no-op, not an error.
pub fn delete_path(record: &Record, path: &str) -> Record {
    let segments: Vec<&str> = path.split('.').collect();
    delete_in(record, &segments)
}

fn delete_in(map: &Record, segments: &[&str]) -> Record {
    let mut updated = map.clone();
    match segments {
        [] => updated,
        [leaf] => {
            updated.remove(*leaf);
            updated
        }
        [head, rest @ ..] => {
            if let Some(Value::Object(inner)) = map.get(*head) {
                let trimmed = delete_in(inner, rest);
                updated.insert((*head).to_string(), Value::Object(trimmed));
            }
            updated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("test fixture is an object")
    }

    #[test]
    fn get_top_level() {
        let r = record(json!({"a": 1}));
        assert_eq!(get_path(&r, "a"), Some(&json!(1)));
    }

    #[test]
    fn get_nested() {
        let r = record(json!({"a": {"b": {"c": "deep"}}}));
        assert_eq!(get_path(&r, "a.b.c"), Some(&json!("deep")));
    }

    #[test]
    fn get_absent_is_none() {
        let r = record(json!({"a": {"b": 1}}));
        assert_eq!(get_path(&r, "a.c"), None);
        assert_eq!(get_path(&r, "x"), None);
    }

    #[test]
    fn get_through_non_object_is_none() {
        let r = record(json!({"a": 5}));
        assert_eq!(get_path(&r, "a.b"), None);
    }

    #[test]
    fn get_null_is_present() {
        let r = record(json!({"a": null}));
        assert_eq!(get_path(&r, "a"), Some(&Value::Null));
    }

    #[test]
    fn set_builds_intermediates() {
        let r = record(json!({}));
        let out = set_path(&r, "a.b.c", json!(7));
        assert_eq!(get_path(&out, "a.b.c"), Some(&json!(7)));
    }

    #[test]
    fn set_replaces_non_object_intermediate() {
        let r = record(json!({"a": 1}));
        let out = set_path(&r, "a.b", json!(2));
        assert_eq!(out, record(json!({"a": {"b": 2}})));
    }

    #[test]
    fn set_keeps_siblings() {
        let r = record(json!({"a": {"x": 1}, "other": true}));
        let out = set_path(&r, "a.y", json!(2));
        assert_eq!(out, record(json!({"a": {"x": 1, "y": 2}, "other": true})));
    }

    #[test]
    fn set_does_not_mutate_input() {
        let r = record(json!({"a": {"b": 1}}));
        let snapshot = r.clone();
        let _ = set_path(&r, "a.b", json!(99));
        assert_eq!(r, snapshot);
    }

    #[test]
    fn delete_nested_leaf() {
        let r = record(json!({"a": {"b": 1, "c": 2}}));
        let out = delete_path(&r, "a.b");
        assert_eq!(out, record(json!({"a": {"c": 2}})));
    }

    #[test]
    fn delete_absent_is_noop() {
        let r = record(json!({"a": {"b": 1}}));
        assert_eq!(delete_path(&r, "a.z"), r);
        assert_eq!(delete_path(&r, "z"), r);
    }

    #[test]
    fn delete_through_non_object_is_noop() {
        let r = record(json!({"a": 1}));
        assert_eq!(delete_path(&r, "a.b"), r);
    }

    #[test]
    fn delete_does_not_mutate_input() {
        let r = record(json!({"a": {"b": 1}}));
        let snapshot = r.clone();
        let _ = delete_path(&r, "a.b");
        assert_eq!(r, snapshot);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn path_strategy() -> impl Strategy<Value = String> {
            proptest::collection::vec("[a-z]{1,4}", 1..4).prop_map(|parts| parts.join("."))
        }

        proptest! {
            #[test]
            fn set_then_get_roundtrips(path in path_strategy(), n in 0i64..1000) {
                let r = Record::new();
                let out = set_path(&r, &path, json!(n));
                prop_assert_eq!(get_path(&out, &path), Some(&json!(n)));
            }

            #[test]
            fn set_then_delete_removes(path in path_strategy(), n in 0i64..1000) {
                let r = Record::new();
                let out = delete_path(&set_path(&r, &path, json!(n)), &path);
                prop_assert_eq!(get_path(&out, &path), None);
            }

            #[test]
            fn set_never_mutates_input(path in path_strategy(), n in 0i64..1000) {
                let r: Record = serde_json::from_value(json!({"keep": {"this": true}})).unwrap();
                let snapshot = r.clone();
                let _ = set_path(&r, &path, json!(n));
                prop_assert_eq!(r, snapshot);
            }
        }
    }
}
