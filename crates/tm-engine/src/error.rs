//! Error types for tm-engine

use thiserror::Error;
use tm_core::CoreError;
use tm_db::{DbError, SchemaVersion};

/// Broad category of an engine failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad directory, no files, bad filenames, unreadable files
    Discovery,
    /// Duplicate sequence numbers
    Ordering,
    /// Recorded history no longer matches the files on disk
    Integrity,
    /// A migration statement failed against the database
    Execution,
    /// Metadata schema is unsupported or could not be upgraded
    Schema,
    /// Unknown adoption target or adoption during a dry run
    Adoption,
    /// Reading or writing the metadata tables failed
    Store,
}

/// Migration engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// File discovery or reading failed
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Metadata store operation failed
    #[error(transparent)]
    Store(#[from] DbError),

    /// History was reordered on disk (M001)
    #[error("[M001] Migration history reordered at position {position}: recorded '{recorded}' but found '{on_disk}' on disk; migrations must not be inserted earlier in history")]
    HistoryReordered {
        position: usize,
        recorded: String,
        on_disk: String,
    },

    /// An applied migration was edited (M002)
    #[error("[M002] Checksum mismatch for applied migration '{filename}': recorded {recorded}, file now {current}")]
    ChecksumMismatch {
        filename: String,
        recorded: String,
        current: String,
    },

    /// Applied migrations are gone from disk (M003)
    #[error("[M003] Applied migrations missing from disk: {}", filenames.join(", "))]
    MissingMigrations { filenames: Vec<String> },

    /// Migration file has no executable statements (M004)
    #[error("[M004] Migration '{filename}' contains no executable statements")]
    EmptyMigrationFile { filename: String },

    /// More checkpoints than statements (M005)
    #[error("[M005] Migration '{filename}' has {checkpoints} checkpoint(s) but only {statements} statement(s); it was edited after partially running")]
    CheckpointOverrun {
        filename: String,
        checkpoints: usize,
        statements: usize,
    },

    /// A checkpointed statement was edited (M006)
    #[error("[M006] Statement {index} of '{filename}' changed since it was executed")]
    CheckpointChecksumMismatch { filename: String, index: usize },

    /// Statement failed to execute (M007)
    #[error("[M007] Statement {index} of '{filename}' failed: {source}\n{statement}")]
    StatementExecutionFailed {
        filename: String,
        index: usize,
        statement: String,
        #[source]
        source: DbError,
    },

    /// Metadata schema is newer than this build (M008)
    #[error("[M008] Metadata schema version {found} is newer than the supported version {supported}; upgrade tidemark")]
    UnsupportedSchemaVersion {
        found: SchemaVersion,
        supported: SchemaVersion,
    },

    /// Metadata schema upgrade failed and was rolled back (M009)
    #[error("[M009] Metadata schema upgrade from version {from} to {to} failed: {source}")]
    SchemaUpgradeFailed {
        from: SchemaVersion,
        to: SchemaVersion,
        #[source]
        source: DbError,
    },

    /// Adoption target is not in the file set (M010)
    #[error("[M010] Adoption target '{target}' is not a migration in the directory")]
    UnknownAdoptionTarget { target: String },

    /// Adoption writes history, which a dry run must not do (M011)
    #[error("[M011] Adoption cannot be combined with a dry run")]
    AdoptionWithDryRun,
}

impl EngineError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(e) if e.is_ordering() => ErrorKind::Ordering,
            EngineError::Core(_) => ErrorKind::Discovery,
            EngineError::Store(_) => ErrorKind::Store,
            EngineError::HistoryReordered { .. }
            | EngineError::ChecksumMismatch { .. }
            | EngineError::MissingMigrations { .. }
            | EngineError::CheckpointOverrun { .. }
            | EngineError::CheckpointChecksumMismatch { .. } => ErrorKind::Integrity,
            EngineError::EmptyMigrationFile { .. } => ErrorKind::Discovery,
            EngineError::StatementExecutionFailed { .. } => ErrorKind::Execution,
            EngineError::UnsupportedSchemaVersion { .. }
            | EngineError::SchemaUpgradeFailed { .. } => ErrorKind::Schema,
            EngineError::UnknownAdoptionTarget { .. } | EngineError::AdoptionWithDryRun => {
                ErrorKind::Adoption
            }
        }
    }
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;
