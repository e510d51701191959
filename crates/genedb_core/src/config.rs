//! Database configuration.

use crate::signal::SignalGate;
use crate::types::EntityKind;
use std::collections::BTreeMap;

/// Default capacity of the undo history.
pub const DEFAULT_UNDO_HISTORY: usize = 1000;

/// Pattern of automatically assigned public ids: a prefix followed by a
/// zero-padded counter, e.g. `I0042`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPrefix {
    /// Leading text.
    pub prefix: String,
    /// Minimum digits of the counter.
    pub width: usize,
}

impl IdPrefix {
    /// Creates a pattern.
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
        }
    }

    /// Default pattern for a kind (`I0000`, `F0000`, ...).
    #[must_use]
    pub fn default_for(kind: EntityKind) -> Self {
        Self::new(kind.default_prefix(), 4)
    }

    /// Renders the id with counter `n`.
    #[must_use]
    pub fn format(&self, n: u64) -> String {
        format!("{}{:0width$}", self.prefix, n, width = self.width)
    }
}

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Refuse every mutation.
    pub read_only: bool,

    /// Maximum number of transactions kept for undo.
    pub undo_history_size: usize,

    /// Create the directory if it does not exist.
    pub create_if_missing: bool,

    /// Run schema migrations when an older database is opened.
    pub auto_upgrade: bool,

    /// Per-kind id patterns. Kinds not listed use [`IdPrefix::default_for`].
    pub id_prefixes: BTreeMap<EntityKind, IdPrefix>,

    /// Gate shared with other databases, if any.
    pub signal_gate: Option<SignalGate>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_only: false,
            undo_history_size: DEFAULT_UNDO_HISTORY,
            create_if_missing: true,
            auto_upgrade: true,
            id_prefixes: BTreeMap::new(),
            signal_gate: None,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the database refuses mutations.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// Sets the undo history capacity.
    #[must_use]
    pub const fn undo_history_size(mut self, size: usize) -> Self {
        self.undo_history_size = size;
        self
    }

    /// Sets whether to create the database if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether older schemas are migrated on open.
    #[must_use]
    pub const fn auto_upgrade(mut self, value: bool) -> Self {
        self.auto_upgrade = value;
        self
    }

    /// Overrides the id pattern of one kind.
    #[must_use]
    pub fn id_prefix(mut self, kind: EntityKind, prefix: IdPrefix) -> Self {
        self.id_prefixes.insert(kind, prefix);
        self
    }

    /// Shares a signal gate.
    #[must_use]
    pub fn signal_gate(mut self, gate: SignalGate) -> Self {
        self.signal_gate = Some(gate);
        self
    }

    /// Id pattern in effect for a kind.
    #[must_use]
    pub fn prefix_for(&self, kind: EntityKind) -> IdPrefix {
        self.id_prefixes
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| IdPrefix::default_for(kind))
    }
}
