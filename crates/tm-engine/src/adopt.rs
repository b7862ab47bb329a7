//! Adoption of an already provisioned database
//!
//! Adopting records history for a prefix of the file set without executing
//! any SQL. It is how a database that was built by other means is brought
//! under management.

use crate::error::{EngineError, EngineResult};
use tm_core::FileSet;
use tm_db::Store;

/// Record every file up to and including `target` as applied.
///
/// Only the base name of `target` is significant. Returns the names of the
/// adopted files in history order; their count is the position history
/// validation resumes from.
pub async fn adopt_through(
    store: &dyn Store,
    files: &FileSet,
    target: &str,
) -> EngineResult<Vec<String>> {
    let last = files
        .position(target)
        .ok_or_else(|| EngineError::UnknownAdoptionTarget {
            target: target.to_string(),
        })?;

    let mut adopted = Vec::with_capacity(last + 1);
    for file in files.iter().take(last + 1) {
        let migration = file.load()?;
        store.upsert_migration(&migration).await?;
        log::info!("Adopted {} without executing it", file.name());
        adopted.push(migration.filename);
    }
    Ok(adopted)
}

#[cfg(test)]
#[path = "adopt_test.rs"]
mod tests;
