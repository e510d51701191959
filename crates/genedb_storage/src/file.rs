//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A file-based blob backend.
///
/// # Durability
///
/// `store` uses the write-then-rename pattern:
/// 1. Write the payload to `<path>.tmp`
/// 2. `sync_all` the temporary file
/// 3. Rename it over `<path>`
/// 4. Sync the parent directory (Unix only)
///
/// A crash in the middle leaves either the old or the new payload.
///
/// # Example
///
/// ```no_run
/// use genedb_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("person.cbor")).unwrap();
/// backend.store(b"serialized people").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    temp_path: PathBuf,
}

impl FileBackend {
    /// Opens a file backend at the given path.
    ///
    /// The file itself is not created until the first `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path names a directory.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if path.is_dir() {
            return Err(StorageError::InvalidPath {
                path: path.to_path_buf(),
            });
        }

        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");

        Ok(Self {
            path: path.to_path_buf(),
            temp_path: PathBuf::from(temp),
        })
    }

    /// Opens a file backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(unix)]
    fn sync_parent(&self) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                File::open(parent)?.sync_all()?;
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) -> StorageResult<()> {
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&mut self, data: &[u8]) -> StorageResult<()> {
        let mut file = File::create(&self.temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.temp_path, &self.path)?;
        self.sync_parent()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn size(&self) -> StorageResult<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&mut self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
