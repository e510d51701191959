//! Error types for GeneDB core.

use crate::model::Handle;
use crate::types::EntityKind;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in GeneDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] genedb_storage::StorageError),

    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] genedb_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No live record with this handle or public id.
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Kind that was searched.
        kind: EntityKind,
        /// Handle or public id that was not found.
        key: String,
    },

    /// Mutation attempted on a store that does not accept writes.
    #[error("read-only: {operation} refused")]
    ReadOnly {
        /// The refused operation.
        operation: String,
    },

    /// Transaction or history state does not allow the operation.
    #[error("invalid transition: {message}")]
    InvalidTransition {
        /// Description of why the transition is invalid.
        message: String,
    },

    /// A signal was connected or emitted against its declaration.
    #[error("signal contract violation: {message}")]
    SignalContractViolation {
        /// Description of the violation.
        message: String,
    },

    /// The operation would leave live records pointing at a missing handle.
    #[error("{kind} {handle} is still referenced by {} record(s)", referrers.len())]
    ReferentialDangling {
        /// Kind of the referenced record.
        kind: EntityKind,
        /// The referenced handle.
        handle: Handle,
        /// Live records that hold a reference.
        referrers: Vec<(EntityKind, Handle)>,
    },

    /// Public id is already used by another record of the same kind.
    #[error("{kind} id {id} is already used by {existing}")]
    IdCollision {
        /// Kind of the record.
        kind: EntityKind,
        /// The colliding public id.
        id: String,
        /// Handle currently owning the id.
        existing: Handle,
    },

    /// Handle belonged to a removed record and cannot be reused.
    #[error("{kind} handle {handle} belonged to a removed record")]
    HandleRetired {
        /// Kind of the record being written.
        kind: EntityKind,
        /// The retired handle.
        handle: Handle,
    },

    /// Record was committed without a handle.
    #[error("{kind} record has no handle")]
    MissingHandle {
        /// Kind of the record.
        kind: EntityKind,
    },

    /// Invalid database format.
    #[error("invalid database format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Stored schema version cannot be used by this build.
    #[error("schema version mismatch: database is v{found}, expected v{expected}")]
    SchemaMismatch {
        /// Version found on disk.
        found: u32,
        /// Version this build reads and writes.
        expected: u32,
    },

    /// Database directory is locked by another process.
    #[error("database locked: another process has exclusive access")]
    DatabaseLocked,

    /// Migration failed.
    #[error("migration failed: {message}")]
    MigrationFailed {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(kind: EntityKind, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// Creates a read-only error.
    pub fn read_only(operation: impl Into<String>) -> Self {
        Self::ReadOnly {
            operation: operation.into(),
        }
    }

    /// Creates an invalid transition error.
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::InvalidTransition {
            message: message.into(),
        }
    }

    /// Creates a signal contract violation error.
    pub fn signal_violation(message: impl Into<String>) -> Self {
        Self::SignalContractViolation {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a migration failed error.
    pub fn migration_failed(message: impl Into<String>) -> Self {
        Self::MigrationFailed {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
