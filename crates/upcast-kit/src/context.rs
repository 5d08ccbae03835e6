use std::collections::BTreeMap;

use serde_json::Value;

/// Call-scoped diagnostics collector for one upcast invocation.
///
/// Created and owned by the caller, passed by mutable reference into
/// [`upcast`](crate::upcast) and the operations. Holds the ordered list
/// of applied `(from, to)` steps, warnings accumulated by operations,
/// and a free-form notes map for anything a step wants to hand back.
///
/// A context is not thread-safe and must never be shared across
/// concurrent upcast calls — create a fresh one per call.
///
/// # Example
///
/// ```
/// use upcast_kit::UpcastContext;
///
/// let mut ctx = UpcastContext::new();
/// ctx.warn("something soft went wrong");
/// assert_eq!(ctx.warnings.len(), 1);
/// assert!(ctx.applied_steps.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpcastContext {
    /// Ordered `(from_version, to_version)` pairs of every applied step.
    pub applied_steps: Vec<(u32, u32)>,
    /// Warnings collected by operations (move skips, soft cast failures).
    pub warnings: Vec<String>,
    /// Free-form notes a step may attach for the caller.
    pub notes: BTreeMap<String, Value>,
}

impl UpcastContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Whether any warnings were collected.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
