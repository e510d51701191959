//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The path cannot hold a table (e.g. it is a directory).
    #[error("invalid table path: {}", path.display())]
    InvalidPath {
        /// Offending path.
        path: PathBuf,
    },

    /// The stored payload is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}
