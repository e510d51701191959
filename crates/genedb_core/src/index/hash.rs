//! Non-unique hash index.

use crate::index::traits::{Index, IndexKey};
use crate::model::Handle;
use std::collections::{BTreeSet, HashMap};

/// Maps a key to a set of handles.
///
/// Used for grouping keys such as surnames, where many records share one
/// key and one record may carry several keys.
#[derive(Debug)]
pub struct HashIndex<K: IndexKey> {
    name: String,
    entries: HashMap<K, BTreeSet<Handle>>,
    count: usize,
}

impl<K: IndexKey> HashIndex<K> {
    /// Creates an empty index.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
            count: 0,
        }
    }

    /// Adds a key-handle mapping.
    pub fn insert(&mut self, key: K, handle: Handle) {
        if self.entries.entry(key).or_default().insert(handle) {
            self.count += 1;
        }
    }

    /// Every distinct key, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        let mut keys: Vec<K> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl<K: IndexKey> Index<K> for HashIndex<K> {
    fn name(&self) -> &str {
        &self.name
    }

    fn remove(&mut self, key: &K, handle: Handle) -> bool {
        if let Some(set) = self.entries.get_mut(key) {
            if set.remove(&handle) {
                self.count -= 1;
                if set.is_empty() {
                    self.entries.remove(key);
                }
                return true;
            }
        }
        false
    }

    fn lookup(&self, key: &K) -> Vec<Handle> {
        self.entries
            .get(key)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn len(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.count = 0;
    }
}
