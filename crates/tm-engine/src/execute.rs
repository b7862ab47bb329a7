//! Checkpointed execution of a single migration file
//!
//! Statements are committed one at a time. After each statement succeeds a
//! checkpoint row is written for it, so a run that dies part way through a
//! file resumes after the last checkpoint instead of starting over. A crash
//! between a statement and its checkpoint re-executes that one statement.

use crate::error::{EngineError, EngineResult};
use tm_core::{split_statements, Checkpoint, MigrationFile};
use tm_db::Store;

/// Apply `file`, resuming from any checkpoints a previous run left behind.
///
/// The last statement is not checkpointed: its success is recorded by
/// completing the migration, which clears the file's checkpoints and writes
/// the history row in one transaction.
pub async fn apply_file(store: &dyn Store, file: &MigrationFile) -> EngineResult<()> {
    let migration = file.load()?;
    let filename = migration.filename.as_str();
    let statements = split_statements(&migration.content);
    if statements.is_empty() {
        return Err(EngineError::EmptyMigrationFile {
            filename: filename.to_string(),
        });
    }

    let checkpoints = store.list_checkpoints(filename).await?;
    if checkpoints.len() >= statements.len() {
        return Err(EngineError::CheckpointOverrun {
            filename: filename.to_string(),
            checkpoints: checkpoints.len(),
            statements: statements.len(),
        });
    }
    if !checkpoints.is_empty() {
        log::info!(
            "Resuming {filename} after {} of {} statement(s)",
            checkpoints.len(),
            statements.len()
        );
    }

    let last = statements.len() - 1;
    for (index, statement) in statements.iter().enumerate() {
        let checkpoint = Checkpoint::new(filename, index, *statement);

        if let Some(recorded) = checkpoints.get(index) {
            if *recorded != checkpoint.checksum {
                return Err(EngineError::CheckpointChecksumMismatch {
                    filename: filename.to_string(),
                    index,
                });
            }
            log::debug!("{filename}: statement {index} already executed");
            continue;
        }

        log::debug!("{filename}: executing statement {index}");
        store
            .execute(statement)
            .await
            .map_err(|source| EngineError::StatementExecutionFailed {
                filename: filename.to_string(),
                index,
                statement: statement.to_string(),
                source,
            })?;

        // A full set of checkpoints would trip CheckpointOverrun on resume
        if index < last {
            store.insert_checkpoint(&checkpoint).await?;
        }
    }

    store.complete_migration(&migration).await?;
    Ok(())
}

#[cfg(test)]
#[path = "execute_test.rs"]
mod tests;
