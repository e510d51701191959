//! Index traits.

use crate::model::Handle;
use std::hash::Hash;

/// A key that can be indexed.
pub trait IndexKey: Clone + Eq + Hash + Ord + Send + Sync + 'static {}

impl<T: Clone + Eq + Hash + Ord + Send + Sync + 'static> IndexKey for T {}

/// Operations shared by every index.
pub trait Index<K: IndexKey>: Send + Sync {
    /// Name of the index, used in log output.
    fn name(&self) -> &str;

    /// Removes a key-handle mapping. Returns whether it was present.
    fn remove(&mut self, key: &K, handle: Handle) -> bool;

    /// Handles stored under `key`.
    fn lookup(&self, key: &K) -> Vec<Handle>;

    /// Whether the index holds `key`.
    fn contains(&self, key: &K) -> bool;

    /// Number of key-handle mappings.
    fn len(&self) -> usize;

    /// Returns true if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every mapping.
    fn clear(&mut self);
}
