//! Persisted record types shared by the engine and the storage backends

use crate::checksum::compute_checksum;

/// A migration file whose statements have all been executed.
///
/// `content` is the verbatim file text at the time it was applied and
/// `checksum` its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Base filename, unique across history
    pub filename: String,
    /// File content when the migration was applied
    pub content: String,
    /// Checksum of `content`
    pub checksum: String,
}

impl Migration {
    /// Build a record from file content, computing its checksum
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            filename: filename.into(),
            checksum: compute_checksum(&content),
            content,
        }
    }
}

/// One executed statement of a migration that has not finished yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// File the statement belongs to
    pub filename: String,
    /// Zero-based position in the file's statement list
    pub idx: usize,
    /// Statement text
    pub content: String,
    /// Checksum of `content`
    pub checksum: String,
}

impl Checkpoint {
    /// Build a checkpoint for statement `idx` of `filename`
    pub fn new(filename: impl Into<String>, idx: usize, statement: impl Into<String>) -> Self {
        let content = statement.into();
        Self {
            filename: filename.into(),
            idx,
            checksum: compute_checksum(&content),
            content,
        }
    }
}
