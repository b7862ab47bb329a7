//! Metadata schema detection and one-time upgrades

use crate::error::{EngineError, EngineResult};
use tm_core::{FileSet, Migration};
use tm_db::{SchemaVersion, Store, CURRENT_SCHEMA_VERSION};

/// Brings the metadata tables to the layout this build understands
pub struct SchemaUpgrader<'a> {
    store: &'a dyn Store,
}

impl<'a> SchemaUpgrader<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Ensure all metadata tables exist and upgrade an older layout.
    ///
    /// Returns the version upgraded from, or `None` if the layout was
    /// already current. Older layouts did not persist file content, so
    /// every file in `files` is read and handed to the store.
    pub async fn prepare(&self, files: &FileSet) -> EngineResult<Option<SchemaVersion>> {
        let found = self.store.ensure_version_table().await?;
        if found > CURRENT_SCHEMA_VERSION {
            return Err(EngineError::UnsupportedSchemaVersion {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        self.store.ensure_migration_table().await?;
        self.store.ensure_checkpoint_table().await?;

        if found == CURRENT_SCHEMA_VERSION {
            log::debug!("Metadata schema is at version {found}");
            return Ok(None);
        }

        let contents = files
            .iter()
            .map(|f| f.load())
            .collect::<Result<Vec<Migration>, _>>()?;

        log::info!(
            "Upgrading {} metadata schema from version {found} to {CURRENT_SCHEMA_VERSION}",
            self.store.db_type()
        );
        self.store
            .upgrade_schema(found, &contents)
            .await
            .map_err(|source| EngineError::SchemaUpgradeFailed {
                from: found,
                to: CURRENT_SCHEMA_VERSION,
                source,
            })?;
        Ok(Some(found))
    }
}

#[cfg(test)]
#[path = "upgrade_test.rs"]
mod tests;
