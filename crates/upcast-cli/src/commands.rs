//! Subcommand implementations.
//!
//! Every command writes exactly one JSON envelope to stdout (or a file
//! with `--out`) and maps failures to a stable error code. The envelope
//! format is versioned (`"format": "v1"`) and its keys are emitted in
//! sorted order, so output is diff-friendly and scriptable.

use std::fs;
use std::io::Read;

use serde_json::{json, Value};
use upcast_kit::{
    upcast_with_observer, MigrationRegistry, Record, Target, UpcastContext, UpcastError,
    SCHEMA_VERSION_FIELD,
};

use crate::packs::{load_packs, resolve_pack_names, LoadedPack};

struct CliError {
    code: &'static str,
    message: String,
}

impl CliError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// `upcast registry export` — dump the registry as JSON or DOT.
pub fn registry_export(packs: &[String], format: &str, dot: bool, out: Option<&str>) -> i32 {
    match run_registry_export(packs, format, dot, out) {
        Ok(()) => 0,
        Err(err) => emit_error("registry.export", None, &err),
    }
}

fn run_registry_export(
    packs: &[String],
    format: &str,
    dot: bool,
    out: Option<&str>,
) -> Result<(), CliError> {
    ensure_format(format)?;
    let (registry, loaded) = build_registry(packs)?;
    let export = registry.export();

    if dot {
        return write_output(out, &export.to_dot());
    }

    let payload = json!({
        "format": "v1",
        "command": "registry.export",
        "schema_id": null,
        "success": true,
        "errors": [],
        "schema_ids": export.schema_ids,
        "latest_versions": export.latest_versions,
        "migrations": export.migrations,
        "packs": loaded.iter().map(pack_summary).collect::<Vec<_>>(),
    });
    write_output(out, &payload.to_string())
}

/// `upcast upcast` — read a record from stdin, upcast to latest.
pub fn upcast(schema_id: &str, packs: &[String], format: &str, trace: bool) -> i32 {
    match run_upcast(schema_id, packs, format, trace) {
        Ok(payload) => {
            emit(&payload);
            0
        }
        Err(err) => emit_error("upcast", Some(schema_id), &err),
    }
}

fn run_upcast(
    schema_id: &str,
    packs: &[String],
    format: &str,
    trace: bool,
) -> Result<Value, CliError> {
    ensure_format(format)?;
    let (registry, _) = build_registry(packs)?;
    let record = read_record_from_stdin()?;
    let input_version = record.get(SCHEMA_VERSION_FIELD).cloned();

    let (output, context, steps) = run_walk(&record, schema_id, &registry)?;

    let mut payload = json!({
        "format": "v1",
        "command": "upcast",
        "schema_id": schema_id,
        "success": true,
        "errors": [],
        "input_version": input_version,
        "output_version": output.get(SCHEMA_VERSION_FIELD),
        "record": Value::Object(output),
        "warnings": context.warnings,
        "unknown_fields": unknown_fields(&context),
    });
    if trace {
        payload["trace"] = steps;
    }
    Ok(payload)
}

/// `upcast validate` — like `upcast`, but reports reachability instead
/// of the migrated record.
pub fn validate(schema_id: &str, packs: &[String], format: &str, trace: bool) -> i32 {
    match run_validate(schema_id, packs, format, trace) {
        Ok(payload) => {
            emit(&payload);
            0
        }
        Err(err) => emit_error("validate", Some(schema_id), &err),
    }
}

fn run_validate(
    schema_id: &str,
    packs: &[String],
    format: &str,
    trace: bool,
) -> Result<Value, CliError> {
    ensure_format(format)?;
    let (registry, _) = build_registry(packs)?;
    let record = read_record_from_stdin()?;

    let (_, context, steps) = run_walk(&record, schema_id, &registry)?;

    let mut payload = json!({
        "format": "v1",
        "command": "validate",
        "schema_id": schema_id,
        "success": true,
        "errors": [],
        "is_valid": true,
        "violations": [],
        "warnings": context.warnings,
    });
    if trace {
        payload["trace"] = steps;
    }
    Ok(payload)
}

fn run_walk(
    record: &Record,
    schema_id: &str,
    registry: &MigrationRegistry,
) -> Result<(Record, UpcastContext, Value), CliError> {
    let mut context = UpcastContext::new();
    let mut steps = Vec::new();

    let output = upcast_with_observer(
        record,
        schema_id,
        registry,
        Target::Latest,
        Some(&mut context),
        |sid, from, to| {
            steps.push(json!({
                "schema_id": sid,
                "from_version": from,
                "to_version": to,
            }));
        },
    )
    .map_err(|e| CliError::new(error_code(&e), e.to_string()))?;

    Ok((output, context, Value::Array(steps)))
}

fn ensure_format(format: &str) -> Result<(), CliError> {
    if format == "v1" {
        Ok(())
    } else {
        Err(CliError::new(
            "unsupported_format",
            format!("unsupported format '{format}'"),
        ))
    }
}

fn build_registry(packs: &[String]) -> Result<(MigrationRegistry, Vec<LoadedPack>), CliError> {
    let names = resolve_pack_names(packs);
    if names.is_empty() {
        return Err(CliError::new(
            "missing_packs",
            format!("no packs selected; use --pack or {}", crate::packs::PACKS_ENV),
        ));
    }
    let mut registry = MigrationRegistry::new();
    let loaded =
        load_packs(&mut registry, &names).map_err(|(code, message)| CliError::new(code, message))?;
    Ok((registry, loaded))
}

fn error_code(err: &UpcastError) -> &'static str {
    match err {
        UpcastError::MissingSchemaVersion => "missing_schema_version",
        UpcastError::InvalidSchemaVersion { .. } => "invalid_schema_version",
        UpcastError::UnsupportedSchemaId { .. } => "unsupported_schema_id",
        UpcastError::NoMigrationPath { .. } => "no_migration_path",
        UpcastError::CastFailure { .. } => "cast_failure",
    }
}

fn pack_summary(pack: &LoadedPack) -> Value {
    json!({
        "name": pack.name,
        "pack_id": pack.pack_id,
        "schema_ids": pack.schema_ids,
    })
}

fn unknown_fields(context: &UpcastContext) -> Vec<String> {
    match context.notes.get("unknown_fields") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn read_record_from_stdin() -> Result<Record, CliError> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| CliError::new("invalid_json", format!("failed to read stdin: {e}")))?;
    let value: Value = serde_json::from_str(&input)
        .map_err(|e| CliError::new("invalid_json", format!("invalid JSON input: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(CliError::new("invalid_json", "input JSON must be an object")),
    }
}

fn write_output(out: Option<&str>, content: &str) -> Result<(), CliError> {
    match out {
        Some(path) => fs::write(path, content)
            .map_err(|e| CliError::new("write_failed", format!("failed to write '{path}': {e}"))),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

fn emit(payload: &Value) {
    println!("{payload}");
}

fn emit_error(command: &str, schema_id: Option<&str>, err: &CliError) -> i32 {
    let payload = json!({
        "format": "v1",
        "command": command,
        "schema_id": schema_id,
        "success": false,
        "errors": [{
            "code": err.code,
            "message": err.message,
            "details": {},
        }],
    });
    println!("{payload}");
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_cover_the_taxonomy() {
        assert_eq!(
            error_code(&UpcastError::MissingSchemaVersion),
            "missing_schema_version"
        );
        assert_eq!(
            error_code(&UpcastError::NoMigrationPath {
                schema_id: "s".into(),
                from_version: 1,
                to_version: 2,
            }),
            "no_migration_path"
        );
        assert_eq!(
            error_code(&UpcastError::CastFailure {
                path: "age".into(),
                reason: "nope".into(),
            }),
            "cast_failure"
        );
    }

    #[test]
    fn only_format_v1_is_accepted() {
        assert!(ensure_format("v1").is_ok());
        let err = ensure_format("v2").unwrap_err();
        assert_eq!(err.code, "unsupported_format");
    }

    #[test]
    fn unknown_fields_reads_string_lists_only() {
        let mut context = UpcastContext::new();
        context.notes.insert(
            "unknown_fields".to_string(),
            json!(["legacy_flag", 7, "old_name"]),
        );
        assert_eq!(unknown_fields(&context), vec!["legacy_flag", "old_name"]);

        context
            .notes
            .insert("unknown_fields".to_string(), json!("not-a-list"));
        assert!(unknown_fields(&context).is_empty());
    }
}
