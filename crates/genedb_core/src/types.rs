//! Core type definitions for GeneDB.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a transaction.
///
/// Transaction IDs are monotonically increasing and never reused within one
/// open database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// The closed set of record kinds held by a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// An individual.
    Person,
    /// A couple and their children.
    Family,
    /// Something that happened at a date and place.
    Event,
    /// A location.
    Place,
    /// A document the research draws on.
    Source,
    /// Where sources are kept.
    Repository,
    /// An image or other media object.
    Media,
    /// Free text attached to other records.
    Note,
}

impl EntityKind {
    /// Every kind, in table order.
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Person,
        EntityKind::Family,
        EntityKind::Event,
        EntityKind::Place,
        EntityKind::Source,
        EntityKind::Repository,
        EntityKind::Media,
        EntityKind::Note,
    ];

    /// Lower-case name, also used as the table name on disk.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Family => "family",
            EntityKind::Event => "event",
            EntityKind::Place => "place",
            EntityKind::Source => "source",
            EntityKind::Repository => "repository",
            EntityKind::Media => "media",
            EntityKind::Note => "note",
        }
    }

    /// Default public id prefix letter.
    #[must_use]
    pub const fn default_prefix(self) -> &'static str {
        match self {
            EntityKind::Person => "I",
            EntityKind::Family => "F",
            EntityKind::Event => "E",
            EntityKind::Place => "P",
            EntityKind::Source => "S",
            EntityKind::Repository => "R",
            EntityKind::Media => "O",
            EntityKind::Note => "N",
        }
    }

    /// Parses a kind from its lower-case name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Seconds since the Unix epoch, the unit of every change stamp.
#[must_use]
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
