//! Unique index.

use crate::index::traits::{Index, IndexKey};
use crate::model::Handle;
use std::collections::HashMap;
use tracing::warn;

/// Maps each key to exactly one handle.
///
/// Uniqueness is checked by the caller before a write is buffered; applying
/// a write always succeeds. [`UniqueIndex::assign`] overwrites and logs if
/// it displaces another handle, so a corrupt table still loads.
#[derive(Debug)]
pub struct UniqueIndex<K: IndexKey> {
    name: String,
    entries: HashMap<K, Handle>,
}

impl<K: IndexKey + std::fmt::Debug> UniqueIndex<K> {
    /// Creates an empty index.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Maps `key` to `handle`. Returns the handle previously stored under
    /// the key when it differs from `handle`.
    pub fn assign(&mut self, key: K, handle: Handle) -> Option<Handle> {
        match self.entries.insert(key.clone(), handle) {
            Some(previous) if previous != handle => {
                warn!(index = %self.name, ?key, %previous, %handle, "index entry displaced");
                Some(previous)
            }
            _ => None,
        }
    }

    /// The handle stored under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Handle> {
        self.entries.get(key).copied()
    }

    /// Every key, unordered.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.keys()
    }
}

impl<K: IndexKey + std::fmt::Debug> Index<K> for UniqueIndex<K> {
    fn name(&self) -> &str {
        &self.name
    }

    fn remove(&mut self, key: &K, handle: Handle) -> bool {
        // Only drop the entry if it still belongs to this handle.
        if self.entries.get(key) == Some(&handle) {
            self.entries.remove(key);
            true
        } else {
            false
        }
    }

    fn lookup(&self, key: &K) -> Vec<Handle> {
        self.get(key).into_iter().collect()
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
