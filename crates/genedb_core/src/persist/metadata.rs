//! Database metadata.

use crate::error::CoreResult;
use crate::model::Handle;
use crate::types::{unix_now, EntityKind};
use genedb_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Schema version written by this build.
///
/// - 1: person gender stored as an integer code
/// - 2: person gender stored as text
pub const SCHEMA_VERSION: u32 = 2;

/// Contents of `metadata.cbor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Schema version of the table files.
    pub schema_version: u32,
    /// Next counter to try when assigning a public id, per kind.
    #[serde(default)]
    pub id_counters: BTreeMap<EntityKind, u64>,
    /// Home person of the tree.
    #[serde(default)]
    pub default_person: Option<Handle>,
    /// Bookmarked handles per kind, in bookmark order.
    #[serde(default)]
    pub bookmarks: BTreeMap<EntityKind, Vec<Handle>>,
    /// Handles whose records were removed. None of them may be minted
    /// into a new record.
    #[serde(default)]
    pub retired: BTreeSet<Handle>,
    /// Creation time.
    #[serde(default)]
    pub created: i64,
    /// Time of the last save.
    #[serde(default)]
    pub saved: i64,
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

impl Metadata {
    /// Metadata of a new database.
    #[must_use]
    pub fn new() -> Self {
        let now = unix_now();
        Self {
            schema_version: SCHEMA_VERSION,
            id_counters: BTreeMap::new(),
            default_person: None,
            bookmarks: BTreeMap::new(),
            retired: BTreeSet::new(),
            created: now,
            saved: now,
        }
    }

    /// Counter to start from for a kind.
    #[must_use]
    pub fn counter(&self, kind: EntityKind) -> u64 {
        self.id_counters.get(&kind).copied().unwrap_or(0)
    }

    /// Loads metadata; `None` if nothing was stored.
    pub fn load(backend: &dyn StorageBackend) -> CoreResult<Option<Self>> {
        match backend.load()? {
            Some(bytes) if !bytes.is_empty() => Ok(Some(genedb_codec::from_cbor(&bytes)?)),
            _ => Ok(None),
        }
    }

    /// Stores metadata.
    pub fn store(&self, backend: &mut dyn StorageBackend) -> CoreResult<()> {
        backend.store(&genedb_codec::to_cbor(self)?)?;
        Ok(())
    }
}
