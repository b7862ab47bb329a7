//! Error types for tm-core

use thiserror::Error;

/// Core error type for Tidemark
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Migrations directory could not be listed
    #[error("[E001] Failed to read migrations directory '{path}': {source}")]
    DirectoryRead {
        path: String,
        source: std::io::Error,
    },

    /// E002: Directory contains no migration files
    #[error("[E002] No .sql migration files found in '{path}' (is the migrations directory correct?)")]
    NoMigrationsFound { path: String },

    /// E003: Filename does not start with a sequence number
    #[error("[E003] Invalid migration filename '{name}': must begin with a numeric sequence prefix")]
    InvalidFilename { name: String },

    /// E004: Two files share a sequence number
    #[error("[E004] Duplicate sequence number {sequence}: '{first}' and '{second}'")]
    DuplicateSequenceNumber {
        sequence: u64,
        first: String,
        second: String,
    },

    /// E005: Migration file could not be read
    #[error("[E005] Failed to read migration '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    /// E006: Migration file is not UTF-8 text
    #[error("[E006] Migration '{name}' is not valid UTF-8")]
    InvalidEncoding { name: String },

    /// E007: Configuration file not found
    #[error("[E007] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E008: Failed to parse configuration file
    #[error("[E008] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E009: Invalid configuration value
    #[error("[E009] Invalid config: {message}")]
    ConfigInvalid { message: String },
}

impl CoreError {
    /// Whether this error concerns the relative order of migration files
    /// rather than their discovery.
    pub fn is_ordering(&self) -> bool {
        matches!(self, CoreError::DuplicateSequenceNumber { .. })
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
