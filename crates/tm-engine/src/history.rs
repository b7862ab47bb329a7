//! Integrity checks of recorded history against the files on disk
//!
//! Migrations must be the same every run and must never be inserted
//! earlier in history. Both rules are checked here before anything new
//! is executed.

use crate::error::{EngineError, EngineResult};
use tm_core::{FileSet, Migration};

/// Validate `recorded` against `files`, starting at history position `start`.
///
/// Positions before `start` were just written by adoption and are trusted.
/// Every later record must sit at the same position on disk and the file
/// must still hash to the recorded checksum.
pub fn validate_history(
    files: &FileSet,
    recorded: &[Migration],
    start: usize,
) -> EngineResult<()> {
    let checked = recorded.get(start..).unwrap_or_default();

    for (offset, migration) in checked.iter().enumerate() {
        let position = start + offset;
        let Some(file) = files.get(position) else {
            break;
        };
        if file.name() != migration.filename {
            return Err(EngineError::HistoryReordered {
                position,
                recorded: migration.filename.clone(),
                on_disk: file.name().to_string(),
            });
        }

        let current = file.checksum()?;
        if current != migration.checksum {
            return Err(EngineError::ChecksumMismatch {
                filename: migration.filename.clone(),
                recorded: migration.checksum.clone(),
                current,
            });
        }
    }

    // Every position on disk matched, so whatever history remains has no file
    let missing: Vec<String> = recorded
        .get(start.max(files.len())..)
        .unwrap_or_default()
        .iter()
        .map(|m| m.filename.clone())
        .collect();
    if !missing.is_empty() {
        for filename in &missing {
            log::warn!("Applied migration {filename} is missing from disk");
        }
        return Err(EngineError::MissingMigrations { filenames: missing });
    }

    log::debug!("Validated {} applied migration(s)", checked.len());
    Ok(())
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
