use core::fmt;

/// Error during an upcast call.
///
/// Any of these aborts the call immediately — no partially-migrated
/// record is ever returned, and nothing is retried internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpcastError {
    /// The input record has no `schema_version` field.
    MissingSchemaVersion,
    /// The `schema_version` field is not a non-negative integer
    /// (booleans are rejected even though JSON treats them distinctly).
    InvalidSchemaVersion {
        /// Rendering of the offending value.
        found: String,
    },
    /// The schema id has no registered latest version (for "latest"
    /// targets) or no registered artifacts at all (for explicit targets).
    UnsupportedSchemaId {
        /// The unknown schema id.
        schema_id: String,
    },
    /// The step chain has a gap at the current version, or the caller
    /// requested a downcast.
    NoMigrationPath {
        /// Schema id being walked.
        schema_id: String,
        /// Version the walk stopped at.
        from_version: u32,
        /// Version that could not be reached.
        to_version: u32,
    },
    /// A `Cast` operation configured to raise failed.
    CastFailure {
        /// Path the cast was applied to.
        path: String,
        /// What the caster reported.
        reason: String,
    },
}

impl fmt::Display for UpcastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSchemaVersion => {
                write!(f, "record is missing the required 'schema_version' field")
            }
            Self::InvalidSchemaVersion { found } => {
                write!(f, "schema_version must be a non-negative integer; got {found}")
            }
            Self::UnsupportedSchemaId { schema_id } => {
                write!(f, "schema id '{schema_id}' is not registered")
            }
            Self::NoMigrationPath {
                schema_id,
                from_version,
                to_version,
            } => {
                write!(
                    f,
                    "no migration path from v{from_version} to v{to_version} for '{schema_id}'"
                )
            }
            Self::CastFailure { path, reason } => {
                write!(f, "cast failed for path '{path}': {reason}")
            }
        }
    }
}

impl std::error::Error for UpcastError {}

/// Error registering a migration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A registered edge must satisfy `to_version == from_version + 1`.
    NonSequentialStep {
        /// Offered source version.
        from: u32,
        /// Offered target version.
        to: u32,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonSequentialStep { from, to } => {
                write!(
                    f,
                    "non-sequential step v{from}→v{to}: to_version must equal from_version + 1"
                )
            }
        }
    }
}

impl std::error::Error for RegistryError {}
