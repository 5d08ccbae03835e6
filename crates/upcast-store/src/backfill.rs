use core::fmt;

use serde::Serialize;
use serde_json::Value;
use upcast_kit::{
    upcast_to_latest, MigrationRegistry, Record, UpcastContext, UpcastError, SCHEMA_VERSION_FIELD,
};

use crate::traits::DocumentStore;

/// Number of failure messages kept verbatim in a [`BackfillReport`].
const FAILURE_SAMPLE_LIMIT: usize = 20;

/// Error from a store helper.
#[derive(Debug)]
pub enum StoreError<E> {
    /// Error from the underlying storage backend.
    Backend(E),
    /// Error from the upcast core.
    Upcast(UpcastError),
    /// A record to write carries a version beyond the registered latest.
    VersionBeyondLatest {
        /// Version found on the record.
        found: u32,
        /// Latest registered version.
        latest: u32,
    },
}

impl<E: fmt::Debug + fmt::Display> fmt::Display for StoreError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(e) => write!(f, "store error: {e}"),
            Self::Upcast(e) => write!(f, "upcast error: {e}"),
            Self::VersionBeyondLatest { found, latest } => {
                write!(f, "record schema_version {found} exceeds latest version {latest}")
            }
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for StoreError<E> {}

impl<E> From<UpcastError> for StoreError<E> {
    fn from(err: UpcastError) -> Self {
        Self::Upcast(err)
    }
}

/// Fetch the record at `(schema_id, key)` upcast to the latest version.
///
/// Returns `None` when the key does not exist. The stored record is
/// left untouched — only the returned copy is upcast.
pub fn read_latest<S: DocumentStore>(
    store: &S,
    schema_id: &str,
    registry: &MigrationRegistry,
    key: &str,
    ctx: Option<&mut UpcastContext>,
) -> Result<Option<Record>, StoreError<S::Error>> {
    let record = match store.get(schema_id, key).map_err(StoreError::Backend)? {
        Some(record) => record,
        None => return Ok(None),
    };
    let upcasted = upcast_to_latest(&record, schema_id, registry, ctx)?;
    Ok(Some(upcasted))
}

/// Write `record` at the latest version.
///
/// A missing `schema_version` is stamped with the registered latest. A
/// present one is validated: beyond latest is refused, below latest is
/// upcast before the write.
pub fn write_latest<S: DocumentStore>(
    store: &mut S,
    schema_id: &str,
    registry: &MigrationRegistry,
    key: &str,
    record: &Record,
    ctx: Option<&mut UpcastContext>,
) -> Result<(), StoreError<S::Error>> {
    let latest = registry.latest_version(schema_id)?;

    let to_write = match record.get(SCHEMA_VERSION_FIELD) {
        None => {
            let mut stamped = record.clone();
            stamped.insert(SCHEMA_VERSION_FIELD.to_string(), Value::from(latest));
            stamped
        }
        Some(_) => {
            let version = record_version(record)?;
            if version > latest {
                return Err(StoreError::VersionBeyondLatest {
                    found: version,
                    latest,
                });
            }
            if version < latest {
                upcast_to_latest(record, schema_id, registry, ctx)?
            } else {
                record.clone()
            }
        }
    };

    store
        .put(schema_id, key, to_write)
        .map_err(StoreError::Backend)
}

/// Outcome of one [`backfill_to_latest`] sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Records visited.
    pub total: usize,
    /// Records rewritten at a newer version.
    pub changed: usize,
    /// Records already at the latest version.
    pub unchanged: usize,
    /// Records that could not be upcast or written back.
    pub failures: usize,
    /// Up to the first 20 failure messages, verbatim.
    pub failure_samples: Vec<String>,
}

impl BackfillReport {
    fn record_failure(&mut self, message: String) {
        self.failures += 1;
        if self.failure_samples.len() < FAILURE_SAMPLE_LIMIT {
            self.failure_samples.push(message);
        }
    }
}

/// Upcast every record of `schema_id` in place.
///
/// Per-record failures are summarized in the report and never abort the
/// sweep; only a failure to enumerate keys is returned as an error.
/// Records already at the latest version are not rewritten.
pub fn backfill_to_latest<S: DocumentStore>(
    store: &mut S,
    schema_id: &str,
    registry: &MigrationRegistry,
) -> Result<BackfillReport, StoreError<S::Error>> {
    let keys = store.keys(schema_id).map_err(StoreError::Backend)?;
    let mut report = BackfillReport::default();

    for key in keys {
        report.total += 1;

        let record = match store.get(schema_id, &key) {
            Ok(Some(record)) => record,
            Ok(None) => {
                // Deleted between enumeration and read.
                report.record_failure(format!("record '{key}' disappeared during backfill"));
                continue;
            }
            Err(e) => {
                report.record_failure(format!("read failed for '{key}': {e}"));
                continue;
            }
        };

        let mut ctx = UpcastContext::new();
        let upcasted = match upcast_to_latest(&record, schema_id, registry, Some(&mut ctx)) {
            Ok(upcasted) => upcasted,
            Err(e) => {
                report.record_failure(format!("upcast failed for '{key}': {e}"));
                continue;
            }
        };

        if upcasted == record {
            report.unchanged += 1;
            continue;
        }
        match store.put(schema_id, &key, upcasted) {
            Ok(()) => report.changed += 1,
            Err(e) => report.record_failure(format!("write failed for '{key}': {e}")),
        }
    }

    Ok(report)
}

fn record_version<E>(record: &Record) -> Result<u32, StoreError<E>> {
    match record.get(SCHEMA_VERSION_FIELD) {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                StoreError::Upcast(UpcastError::InvalidSchemaVersion {
                    found: n.to_string(),
                })
            }),
        Some(other) => Err(StoreError::Upcast(UpcastError::InvalidSchemaVersion {
            found: other.to_string(),
        })),
        None => Err(StoreError::Upcast(UpcastError::MissingSchemaVersion)),
    }
}
