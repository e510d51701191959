//! Storage backend trait definition.

use crate::error::StorageResult;

/// A blob storage backend for one GeneDB table.
///
/// # Invariants
///
/// - `load` returns exactly the bytes passed to the last successful `store`
/// - `load` returns `None` until the first `store`
/// - a failed `store` leaves the previous payload readable
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Loads the whole payload, or `None` if nothing was ever stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload exists but cannot be read.
    fn load(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the payload with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the new payload could not be made durable. The
    /// previous payload is still readable in that case.
    fn store(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Returns true if a payload has been stored.
    fn exists(&self) -> bool;

    /// Returns the size of the current payload in bytes (0 if absent).
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Removes the payload. Removing an absent payload is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload exists but cannot be removed.
    fn remove(&mut self) -> StorageResult<()>;
}
