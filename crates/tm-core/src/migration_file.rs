//! Migration file discovery and ordering
//!
//! A migration directory is flat: every non-hidden `.sql` file in it is a
//! migration, and its leading run of ASCII digits is the sequence number
//! that decides where it sits in history. That order is the single source
//! of truth for "migration history order" everywhere else in Tidemark.

use crate::checksum::compute_checksum;
use crate::error::{CoreError, CoreResult};
use crate::record::Migration;
use regex::Regex;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Extension carried by every migration file
pub const MIGRATION_EXTENSION: &str = "sql";

/// Entries starting with this marker are ignored during discovery
const HIDDEN_PREFIX: char = '.';

static SEQUENCE_RE: OnceLock<Regex> = OnceLock::new();

/// Parse the leading digit run of a filename as an unsigned sequence number.
///
/// Returns `None` if the name has no leading digits or the number does not
/// fit in a `u64`.
pub fn parse_sequence(name: &str) -> Option<u64> {
    let re = SEQUENCE_RE.get_or_init(|| Regex::new(r"^\d+").expect("valid regex literal"));
    re.find(name).and_then(|m| m.as_str().parse::<u64>().ok())
}

/// Reduce a possibly path-qualified filename to its base name.
pub fn base_name(target: &str) -> &str {
    Path::new(target)
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or(target)
}

/// A single migration file on disk.
///
/// Only the name and location are captured at discovery time; the content
/// is read lazily and re-read every time it is needed so integrity checks
/// always reflect the current state of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    name: String,
    sequence: u64,
    path: PathBuf,
}

impl MigrationFile {
    /// Create a migration file entry for `name` inside `dir`.
    ///
    /// Fails with [`CoreError::InvalidFilename`] if the name has no leading
    /// sequence number.
    pub fn new(dir: &Path, name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        let sequence =
            parse_sequence(&name).ok_or_else(|| CoreError::InvalidFilename { name: name.clone() })?;
        Ok(Self {
            path: dir.join(&name),
            name,
            sequence,
        })
    }

    /// Base filename, e.g. `3_add_index.sql`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric ordering prefix
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Full path to the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw bytes of the file from disk
    pub fn read(&self) -> CoreResult<Vec<u8>> {
        fs::read(&self.path).map_err(|source| CoreError::FileRead {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Read the file as UTF-8 text
    pub fn read_to_string(&self) -> CoreResult<String> {
        String::from_utf8(self.read()?).map_err(|_| CoreError::InvalidEncoding {
            name: self.name.clone(),
        })
    }

    /// Re-read the file and compute its current checksum
    pub fn checksum(&self) -> CoreResult<String> {
        Ok(compute_checksum(self.read()?))
    }

    /// Read the file into a [`Migration`] record (name, content, checksum)
    pub fn load(&self) -> CoreResult<Migration> {
        Ok(Migration::new(self.name.clone(), self.read_to_string()?))
    }
}

/// Sort files by sequence number, rejecting duplicates.
///
/// The result is independent of input order and of everything in a
/// filename after the sequence prefix.
pub fn order_files(mut files: Vec<MigrationFile>) -> CoreResult<Vec<MigrationFile>> {
    files.sort_by(|a, b| {
        a.sequence
            .cmp(&b.sequence)
            .then_with(|| a.name.cmp(&b.name))
    });

    if let Some(pair) = files.windows(2).find(|w| w[0].sequence == w[1].sequence) {
        return Err(CoreError::DuplicateSequenceNumber {
            sequence: pair[0].sequence,
            first: pair[0].name.clone(),
            second: pair[1].name.clone(),
        });
    }

    Ok(files)
}

/// The ordered set of migration files in a directory
#[derive(Debug, Clone)]
pub struct FileSet {
    dir: PathBuf,
    files: Vec<MigrationFile>,
}

impl FileSet {
    /// Discover and order all migration files in `dir`.
    ///
    /// Subdirectories, hidden entries, and files without the `.sql`
    /// extension are skipped. An empty result is an error because it almost
    /// always means the wrong directory was given.
    pub fn discover(dir: impl AsRef<Path>) -> CoreResult<Self> {
        let dir = dir.as_ref();
        let read_err = |source| CoreError::DirectoryRead {
            path: dir.display().to_string(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            if entry.file_type().map_err(read_err)?.is_dir() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                log::warn!(
                    "Skipping non UTF-8 file name in {}: {:?}",
                    dir.display(),
                    name
                );
                continue;
            };
            if name.starts_with(HIDDEN_PREFIX) {
                continue;
            }
            if Path::new(name).extension() != Some(OsStr::new(MIGRATION_EXTENSION)) {
                continue;
            }

            files.push(MigrationFile::new(dir, name)?);
        }

        if files.is_empty() {
            return Err(CoreError::NoMigrationsFound {
                path: dir.display().to_string(),
            });
        }

        Self::from_files(dir, files)
    }

    /// Build a file set from already constructed entries, ordering them.
    pub fn from_files(dir: impl AsRef<Path>, files: Vec<MigrationFile>) -> CoreResult<Self> {
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            files: order_files(files)?,
        })
    }

    /// Directory the files were discovered in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of migration files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File at history position `index`
    pub fn get(&self, index: usize) -> Option<&MigrationFile> {
        self.files.get(index)
    }

    /// Iterate files in history order
    pub fn iter(&self) -> std::slice::Iter<'_, MigrationFile> {
        self.files.iter()
    }

    /// Files from history position `start` onwards
    pub fn from_index(&self, start: usize) -> &[MigrationFile] {
        self.files.get(start..).unwrap_or_default()
    }

    /// History position of the file named `target`.
    ///
    /// Only the base name of `target` is significant, so a path such as
    /// `migrations/2_users.sql` resolves the same as `2_users.sql`.
    pub fn position(&self, target: &str) -> Option<usize> {
        let name = base_name(target);
        self.files.iter().position(|f| f.name == name)
    }

    /// File names in history order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a MigrationFile;
    type IntoIter = std::slice::Iter<'a, MigrationFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
#[path = "migration_file_test.rs"]
mod tests;
