//! SHA-256 checksum utility for migration integrity checks.
//!
//! The same fingerprint is used for whole migration files and for single
//! statements, so stored history and checkpoints are always comparable.

use sha2::{Digest, Sha256};

/// Compute the hex-encoded SHA-256 checksum of a byte sequence
pub fn compute_checksum(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
#[path = "checksum_test.rs"]
mod tests;
