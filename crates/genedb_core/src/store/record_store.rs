//! Per-kind record table.

use crate::index::{HashIndex, Index, UniqueIndex};
use crate::model::{Handle, Record};
use std::collections::HashMap;
use tracing::debug;

/// Records of one kind, with their public-id and grouping indices.
#[derive(Debug)]
pub struct RecordStore<T: Record> {
    records: HashMap<Handle, T>,
    ids: UniqueIndex<String>,
    groups: HashIndex<String>,
}

impl<T: Record> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> RecordStore<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            ids: UniqueIndex::new(format!("{}.gramps_id", T::KIND)),
            groups: HashIndex::new(format!("{}.group", T::KIND)),
        }
    }

    /// Builds a table from loaded records. Records without a handle are
    /// skipped.
    pub fn from_records<I: IntoIterator<Item = T>>(records: I) -> Self {
        let mut store = Self::new();
        for record in records {
            if let Some(handle) = record.handle() {
                store.apply(handle, Some(record));
            }
        }
        store
    }

    /// The live record with this handle.
    #[must_use]
    pub fn get(&self, handle: &Handle) -> Option<&T> {
        self.records.get(handle)
    }

    /// Whether a live record has this handle.
    #[must_use]
    pub fn contains(&self, handle: &Handle) -> bool {
        self.records.contains_key(handle)
    }

    /// Resolves a public id.
    #[must_use]
    pub fn handle_for_id(&self, id: &str) -> Option<Handle> {
        self.ids.get(&id.to_string())
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every handle. With `sorted`, ordered by [`Record::sort_key`] and then
    /// by handle.
    #[must_use]
    pub fn handles(&self, sorted: bool) -> Vec<Handle> {
        if !sorted {
            return self.records.keys().copied().collect();
        }
        let mut keyed: Vec<(String, Handle)> = self
            .records
            .iter()
            .map(|(h, r)| (r.sort_key(), *h))
            .collect();
        keyed.sort();
        keyed.into_iter().map(|(_, h)| h).collect()
    }

    /// Iterates over live records.
    pub fn iter(&self) -> impl Iterator<Item = (&Handle, &T)> + '_ {
        self.records.iter()
    }

    /// Every public id in use, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Distinct grouping keys, sorted.
    #[must_use]
    pub fn group_keys(&self) -> Vec<String> {
        self.groups.keys()
    }

    /// Handles filed under a grouping key.
    #[must_use]
    pub fn group(&self, key: &str) -> Vec<Handle> {
        self.groups.lookup(&key.to_string())
    }

    /// Replaces the record stored under `handle`; `None` removes it.
    ///
    /// The old public id and grouping keys are dropped before the new ones
    /// are filed, so an id change moves index resolution in one step.
    pub fn apply(&mut self, handle: Handle, record: Option<T>) {
        if let Some(old) = self.records.remove(&handle) {
            self.ids.remove(&old.gramps_id().to_string(), handle);
            for key in old.group_keys() {
                self.groups.remove(&key, handle);
            }
        }
        let Some(mut record) = record else {
            debug!(kind = %T::KIND, %handle, "record removed");
            return;
        };
        record.set_handle(handle);
        if !record.gramps_id().is_empty() {
            self.ids.assign(record.gramps_id().to_string(), handle);
        }
        for key in record.group_keys() {
            self.groups.insert(key, handle);
        }
        debug!(kind = %T::KIND, %handle, id = record.gramps_id(), "record stored");
        self.records.insert(handle, record);
    }
}
