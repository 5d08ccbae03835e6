use std::sync::Arc;

use crate::context::UpcastContext;
use crate::error::UpcastError;
use crate::path::Record;

/// A single migration step that transforms a record from one version to
/// the next.
///
/// Steps must be **deterministic and pure** — the input record is never
/// mutated, and the same record always produces the same output. The
/// optional context is only for diagnostics; its absence must not change
/// behavior on the success path.
///
/// Every step uses one canonical two-argument shape. Context-free
/// closures can be adapted at registration time with [`steps::from_fn`],
/// so the calling convention is resolved once, not per invocation.
pub trait Step: Send + Sync {
    /// Apply the step, returning a new record.
    fn apply(
        &self,
        record: &Record,
        ctx: Option<&mut UpcastContext>,
    ) -> Result<Record, UpcastError>;
}

/// A cheaply cloneable shared handle to a step.
///
/// Packs hold their steps as `SharedStep` so the same pack can be
/// registered into more than one registry.
#[derive(Clone)]
pub struct SharedStep(Arc<dyn Step>);

impl SharedStep {
    /// Wrap a step in a shared handle.
    pub fn new(step: impl Step + 'static) -> Self {
        Self(Arc::new(step))
    }
}

impl Step for SharedStep {
    fn apply(
        &self,
        record: &Record,
        ctx: Option<&mut UpcastContext>,
    ) -> Result<Record, UpcastError> {
        self.0.apply(record, ctx)
    }
}

/// Adapters that turn plain functions into [`Step`]s.
pub mod steps {
    use super::*;

    struct FnStep<F>(F);

    impl<F> Step for FnStep<F>
    where
        F: Fn(&Record) -> Record + Send + Sync,
    {
        fn apply(
            &self,
            record: &Record,
            _ctx: Option<&mut UpcastContext>,
        ) -> Result<Record, UpcastError> {
            Ok((self.0)(record))
        }
    }

    struct CtxFnStep<F>(F);

    impl<F> Step for CtxFnStep<F>
    where
        F: Fn(&Record, Option<&mut UpcastContext>) -> Result<Record, UpcastError> + Send + Sync,
    {
        fn apply(
            &self,
            record: &Record,
            ctx: Option<&mut UpcastContext>,
        ) -> Result<Record, UpcastError> {
            (self.0)(record, ctx)
        }
    }

    /// Adapt a context-free, infallible function into a [`Step`].
    ///
    /// This is the registration-time shim for steps that only look at
    /// the record:
    ///
    /// ```
    /// use upcast_kit::steps;
    /// use upcast_kit::Record;
    ///
    /// let step = steps::from_fn(|record: &Record| {
    ///     let mut out = record.clone();
    ///     out.insert("migrated".into(), true.into());
    ///     out
    /// });
    /// # let _ = step;
    /// ```
    pub fn from_fn<F>(f: F) -> impl Step
    where
        F: Fn(&Record) -> Record + Send + Sync + 'static,
    {
        FnStep(f)
    }

    /// Adapt a context-aware function into a [`Step`].
    pub fn from_fn_ctx<F>(f: F) -> impl Step
    where
        F: Fn(&Record, Option<&mut UpcastContext>) -> Result<Record, UpcastError>
            + Send
            + Sync
            + 'static,
    {
        CtxFnStep(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Record {
        let mut r = Record::new();
        r.insert("n".to_string(), json!(1));
        r
    }

    #[test]
    fn from_fn_ignores_context() {
        let step = steps::from_fn(|r: &Record| {
            let mut out = r.clone();
            out.insert("seen".to_string(), json!(true));
            out
        });

        let mut ctx = UpcastContext::new();
        let out = step.apply(&record(), Some(&mut ctx)).unwrap();
        assert_eq!(out["seen"], json!(true));
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn from_fn_ctx_can_warn() {
        let step = steps::from_fn_ctx(|r: &Record, ctx: Option<&mut UpcastContext>| {
            if let Some(ctx) = ctx {
                ctx.warn("heads up");
            }
            Ok(r.clone())
        });

        let mut ctx = UpcastContext::new();
        step.apply(&record(), Some(&mut ctx)).unwrap();
        assert_eq!(ctx.warnings, vec!["heads up".to_string()]);

        // No context: success path unchanged.
        let out = step.apply(&record(), None).unwrap();
        assert_eq!(out, record());
    }

    #[test]
    fn shared_step_clones_point_at_the_same_step() {
        let step = SharedStep::new(steps::from_fn(|r: &Record| {
            let mut out = r.clone();
            out.insert("tag".to_string(), json!("x"));
            out
        }));
        let clone = step.clone();

        let a = step.apply(&record(), None).unwrap();
        let b = clone.apply(&record(), None).unwrap();
        assert_eq!(a, b);
    }
}
