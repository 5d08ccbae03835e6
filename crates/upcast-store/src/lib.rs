//! # upcast-store
//!
//! Document-store boundary for upcast-kit.
//!
//! A [`DocumentStore`] is any backend that can hold JSON records keyed
//! by `(schema_id, key)`. On top of that trait this crate provides the
//! three helpers a store integration needs:
//!
//! - [`read_latest`] — fetch a record and upcast it on the way out.
//! - [`write_latest`] — upcast a stale record (or stamp a missing
//!   version) before it is written.
//! - [`backfill_to_latest`] — sweep a whole schema family in place,
//!   summarizing per-record failures instead of aborting.
//!
//! Retry, batching, and parallelism are owned by the caller — these
//! helpers stay synchronous and single-threaded like the core.

mod backfill;
mod memory;
mod traits;

pub use backfill::{backfill_to_latest, read_latest, write_latest, BackfillReport, StoreError};
pub use memory::{MemoryError, MemoryStore};
pub use traits::DocumentStore;
