//! Declarative migration operations.
//!
//! An [`Op`] is an immutable description of one field-level transform.
//! A migration step is usually a list of operations composed with
//! [`compile_ops`]; each operation's output feeds the next one's input.
//!
//! All operations are total except [`Op::Cast`] configured with
//! [`OnCastError::Raise`] — everything else reports soft outcomes
//! (skips, no-ops, failed coercions) through the context, never as
//! errors.

use core::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::UpcastContext;
use crate::error::UpcastError;
use crate::path::{delete_path, get_path, set_path, Record};
use crate::step::Step;

/// How a failed cast is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnCastError {
    /// Fail the whole call with [`UpcastError::CastFailure`].
    Raise,
    /// Keep the original value, append a warning, continue.
    Warn,
    /// Keep the original value, continue silently.
    Skip,
}

/// A value coercion used by [`Op::Cast`].
///
/// Wraps a pure function from one JSON value to another. The error
/// string is the human-readable reason a coercion was refused; what
/// happens with it is decided by the operation's [`OnCastError`] mode.
#[derive(Clone)]
pub struct Caster {
    label: &'static str,
    f: Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>,
}

impl Caster {
    /// Wrap a coercion function under a short label (used in `Debug`
    /// output only).
    pub fn new<F>(label: &'static str, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            label,
            f: Arc::new(f),
        }
    }

    /// Apply the coercion.
    pub fn cast(&self, value: &Value) -> Result<Value, String> {
        (self.f)(value)
    }

    /// The label given at construction.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl fmt::Debug for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Caster({})", self.label)
    }
}

/// Common casters for the coercions packs reach for most.
pub mod casts {
    use super::*;

    fn kind(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Coerce to an integer. Accepts integers, finite floats
    /// (truncated), numeric strings, and booleans (`true` → 1).
    pub fn to_int() -> Caster {
        Caster::new("to_int", |value| match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(f) => Ok(Value::from(f as i64)),
                None => Err(format!("cannot represent {n} as an integer")),
            },
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("cannot parse '{s}' as an integer")),
            Value::Bool(b) => Ok(Value::from(i64::from(*b))),
            other => Err(format!("cannot cast {} to an integer", kind(other))),
        })
    }

    /// Coerce to a float. Accepts numbers, numeric strings, and
    /// booleans.
    pub fn to_float() -> Caster {
        Caster::new("to_float", |value| {
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                _ => None,
            };
            match parsed.and_then(serde_json::Number::from_f64) {
                Some(n) => Ok(Value::Number(n)),
                None => Err(format!("cannot cast {} to a float", kind(value))),
            }
        })
    }

    /// Coerce scalars to their string rendering. Containers and `null`
    /// are refused.
    pub fn to_string() -> Caster {
        Caster::new("to_string", |value| match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::from(n.to_string())),
            Value::Bool(b) => Ok(Value::from(b.to_string())),
            other => Err(format!("cannot cast {} to a string", kind(other))),
        })
    }

    /// Coerce to a boolean. Accepts booleans, the strings
    /// `"true"`/`"false"`, and integers (0 → `false`, anything else →
    /// `true`).
    pub fn to_bool() -> Caster {
        Caster::new("to_bool", |value| match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) if s == "true" => Ok(Value::from(true)),
            Value::String(s) if s == "false" => Ok(Value::from(false)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::from(i != 0)),
                None => Err(format!("cannot cast {n} to a boolean")),
            },
            other => Err(format!("cannot cast {} to a boolean", kind(other))),
        })
    }
}

/// One declarative transform over a record.
///
/// The set is closed: these six variants are the whole operation
/// vocabulary, and [`Op::apply`] handles them exhaustively. Operations
/// have no identity beyond their configuration.
#[derive(Debug, Clone)]
pub enum Op {
    /// Copy the value at `from` to `to`; unless `keep_source`, delete
    /// `from`. No-op when `from` is absent or equals `to`. The
    /// destination is overwritten unconditionally.
    Rename {
        /// Source path.
        from: String,
        /// Destination path.
        to: String,
        /// Keep the source field instead of deleting it.
        keep_source: bool,
    },
    /// Set `path` to `default` only when it is currently absent. An
    /// existing falsy value (`0`, `""`, `false`) is never overwritten.
    SetDefault {
        /// Path to fill in.
        path: String,
        /// Value to write when absent.
        default: Value,
    },
    /// Delete the value at `path`. Silent no-op when absent.
    Drop {
        /// Path to remove.
        path: String,
    },
    /// Like `Rename` without `keep_source`, but collision-aware: when
    /// `to` already holds a value and `overwrite` is false, the move is
    /// skipped and a warning recorded (first write wins).
    Move {
        /// Source path.
        from: String,
        /// Destination path.
        to: String,
        /// Overwrite an existing destination instead of skipping.
        overwrite: bool,
    },
    /// Copy the first present candidate, in listed order, to `to` —
    /// unless `to` is already present. Candidate order is a correctness
    /// contract.
    Coalesce {
        /// Destination path.
        to: String,
        /// Candidate source paths, tried in order.
        candidates: Vec<String>,
    },
    /// Apply `caster` to the value at `path`. Absent or `null` values
    /// are left alone. Failures are handled per `on_error`.
    Cast {
        /// Path whose value is coerced.
        path: String,
        /// The coercion to apply.
        caster: Caster,
        /// What to do when the coercion fails.
        on_error: OnCastError,
    },
}

impl Op {
    /// `Rename` that deletes the source.
    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Rename {
            from: from.into(),
            to: to.into(),
            keep_source: false,
        }
    }

    /// `Rename` that keeps the source field (a copy, not a move).
    pub fn rename_keeping_source(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Rename {
            from: from.into(),
            to: to.into(),
            keep_source: true,
        }
    }

    /// `SetDefault` at `path`.
    pub fn set_default(path: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::SetDefault {
            path: path.into(),
            default: default.into(),
        }
    }

    /// `Drop` at `path`.
    pub fn drop(path: impl Into<String>) -> Self {
        Self::Drop { path: path.into() }
    }

    /// `Move` with first-write-wins collision handling.
    pub fn move_to(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Move {
            from: from.into(),
            to: to.into(),
            overwrite: false,
        }
    }

    /// `Move` that overwrites an existing destination.
    pub fn move_overwriting(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Move {
            from: from.into(),
            to: to.into(),
            overwrite: true,
        }
    }

    /// `Coalesce` into `to` from `candidates`.
    pub fn coalesce<I, S>(to: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Coalesce {
            to: to.into(),
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    /// `Cast` at `path`.
    pub fn cast(path: impl Into<String>, caster: Caster, on_error: OnCastError) -> Self {
        Self::Cast {
            path: path.into(),
            caster,
            on_error,
        }
    }

    /// Apply the operation, returning a new record.
    ///
    /// The context, when given, only collects diagnostics — leaving it
    /// out never changes what happens on the success path.
    pub fn apply(
        &self,
        record: &Record,
        ctx: Option<&mut UpcastContext>,
    ) -> Result<Record, UpcastError> {
        match self {
            Self::Rename {
                from,
                to,
                keep_source,
            } => {
                let value = match get_path(record, from) {
                    Some(v) if from != to => v.clone(),
                    _ => return Ok(record.clone()),
                };
                if *keep_source {
                    Ok(set_path(record, to, value))
                } else {
                    let removed = delete_path(record, from);
                    Ok(set_path(&removed, to, value))
                }
            }

            Self::SetDefault { path, default } => {
                if get_path(record, path).is_none() {
                    Ok(set_path(record, path, default.clone()))
                } else {
                    Ok(record.clone())
                }
            }

            Self::Drop { path } => Ok(delete_path(record, path)),

            Self::Move {
                from,
                to,
                overwrite,
            } => {
                let value = match get_path(record, from) {
                    Some(v) if from != to => v.clone(),
                    _ => return Ok(record.clone()),
                };
                if get_path(record, to).is_some() && !overwrite {
                    if let Some(ctx) = ctx {
                        ctx.warn(format!(
                            "destination '{to}' exists; move from '{from}' skipped"
                        ));
                    }
                    return Ok(record.clone());
                }
                let removed = delete_path(record, from);
                Ok(set_path(&removed, to, value))
            }

            Self::Coalesce { to, candidates } => {
                if get_path(record, to).is_some() {
                    return Ok(record.clone());
                }
                for candidate in candidates {
                    if let Some(value) = get_path(record, candidate) {
                        let value = value.clone();
                        return Ok(set_path(record, to, value));
                    }
                }
                Ok(record.clone())
            }

            Self::Cast {
                path,
                caster,
                on_error,
            } => {
                let value = match get_path(record, path) {
                    Some(v) if !v.is_null() => v.clone(),
                    _ => return Ok(record.clone()),
                };
                match caster.cast(&value) {
                    Ok(casted) => Ok(set_path(record, path, casted)),
                    Err(reason) => match on_error {
                        OnCastError::Raise => Err(UpcastError::CastFailure {
                            path: path.clone(),
                            reason,
                        }),
                        OnCastError::Warn => {
                            if let Some(ctx) = ctx {
                                ctx.warn(format!("cast failed for path '{path}': {reason}"));
                            }
                            Ok(record.clone())
                        }
                        OnCastError::Skip => Ok(record.clone()),
                    },
                }
            }
        }
    }
}

/// An ordered operation pipeline, usable as a migration [`Step`].
#[derive(Debug, Clone)]
pub struct CompiledOps {
    ops: Vec<Op>,
}

impl CompiledOps {
    /// The operations, in application order.
    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }
}

impl Step for CompiledOps {
    fn apply(
        &self,
        record: &Record,
        mut ctx: Option<&mut UpcastContext>,
    ) -> Result<Record, UpcastError> {
        let mut current = record.clone();
        for op in &self.ops {
            current = op.apply(&current, ctx.as_deref_mut())?;
        }
        Ok(current)
    }
}

/// Compose operations into one transform, applied strictly in list
/// order with the same context threaded through every call. A skipped
/// or no-op operation never short-circuits the pipeline.
pub fn compile_ops(ops: Vec<Op>) -> CompiledOps {
    CompiledOps { ops }
}
