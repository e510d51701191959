//! Database directory management.

use crate::error::{CoreError, CoreResult};
use crate::types::EntityKind;
use fs2::FileExt;
use genedb_storage::FileBackend;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const METADATA_FILE: &str = "metadata.cbor";
const UNDO_FILE: &str = "undo.cbor";

/// An open database directory, locked for exclusive use.
///
/// The lock is held until the value is dropped.
#[derive(Debug)]
pub struct DatabaseDir {
    path: PathBuf,
    _lock_file: File,
}

impl DatabaseDir {
    /// Opens or creates a database directory and takes its lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - The path is not a directory
    /// - Another process holds the lock (`DatabaseLocked`)
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::invalid_format(format!(
                    "database directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_format(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::DatabaseLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the database directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the table file of a kind.
    #[must_use]
    pub fn table_path(&self, kind: EntityKind) -> PathBuf {
        self.path.join(format!("{}.cbor", kind.name()))
    }

    /// Path of the metadata file.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.path.join(METADATA_FILE)
    }

    /// Path of the undo history file.
    #[must_use]
    pub fn undo_path(&self) -> PathBuf {
        self.path.join(UNDO_FILE)
    }

    /// Backend of a kind's table file.
    pub fn table_backend(&self, kind: EntityKind) -> CoreResult<FileBackend> {
        Ok(FileBackend::open(&self.table_path(kind))?)
    }

    /// Backend of the metadata file.
    pub fn metadata_backend(&self) -> CoreResult<FileBackend> {
        Ok(FileBackend::open(&self.metadata_path())?)
    }

    /// Backend of the undo history file.
    pub fn undo_backend(&self) -> CoreResult<FileBackend> {
        Ok(FileBackend::open(&self.undo_path())?)
    }

    /// True when no metadata has been written yet.
    #[must_use]
    pub fn is_new_database(&self) -> bool {
        !self.metadata_path().exists()
    }
}
