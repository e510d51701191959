//! Signals emitted by a database.

use super::{ArgShape, Signal};
use crate::model::Handle;
use crate::types::EntityKind;

/// Change notification of a [`Database`](crate::Database).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbSignal {
    /// A record was created.
    Added {
        /// Kind of the record.
        kind: EntityKind,
        /// The new record.
        handle: Handle,
    },
    /// A record was modified.
    Updated {
        /// Kind of the record.
        kind: EntityKind,
        /// The modified record.
        handle: Handle,
    },
    /// A record was removed.
    Deleted {
        /// Kind of the record.
        kind: EntityKind,
        /// The removed record.
        handle: Handle,
    },
    /// Many records of a kind changed at once; reload everything.
    Rebuilt {
        /// The affected kind.
        kind: EntityKind,
    },
    /// Label of the transaction undo would revert, if any.
    UndoAvailable(Option<String>),
    /// Label of the transaction redo would reapply, if any.
    RedoAvailable(Option<String>),
    /// The home person was set or cleared.
    HomePersonChanged,
}

/// Kinds of [`DbSignal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DbSignalKind {
    Added,
    Updated,
    Deleted,
    Rebuilt,
    UndoAvailable,
    RedoAvailable,
    HomePersonChanged,
}

impl DbSignal {
    /// Standard declaration set of a database bus.
    #[must_use]
    pub fn declarations() -> [(DbSignalKind, ArgShape); 7] {
        [
            (DbSignalKind::Added, ArgShape::KindHandle),
            (DbSignalKind::Updated, ArgShape::KindHandle),
            (DbSignalKind::Deleted, ArgShape::KindHandle),
            (DbSignalKind::Rebuilt, ArgShape::Kind),
            (DbSignalKind::UndoAvailable, ArgShape::Label),
            (DbSignalKind::RedoAvailable, ArgShape::Label),
            (DbSignalKind::HomePersonChanged, ArgShape::Unit),
        ]
    }

    /// Record kind the signal concerns, if any.
    #[must_use]
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            DbSignal::Added { kind, .. }
            | DbSignal::Updated { kind, .. }
            | DbSignal::Deleted { kind, .. }
            | DbSignal::Rebuilt { kind } => Some(*kind),
            DbSignal::UndoAvailable(_)
            | DbSignal::RedoAvailable(_)
            | DbSignal::HomePersonChanged => None,
        }
    }

    /// Handle the signal concerns, if any.
    #[must_use]
    pub fn handle(&self) -> Option<Handle> {
        match self {
            DbSignal::Added { handle, .. }
            | DbSignal::Updated { handle, .. }
            | DbSignal::Deleted { handle, .. } => Some(*handle),
            _ => None,
        }
    }
}

impl Signal for DbSignal {
    type Kind = DbSignalKind;

    fn kind(&self) -> DbSignalKind {
        match self {
            DbSignal::Added { .. } => DbSignalKind::Added,
            DbSignal::Updated { .. } => DbSignalKind::Updated,
            DbSignal::Deleted { .. } => DbSignalKind::Deleted,
            DbSignal::Rebuilt { .. } => DbSignalKind::Rebuilt,
            DbSignal::UndoAvailable(_) => DbSignalKind::UndoAvailable,
            DbSignal::RedoAvailable(_) => DbSignalKind::RedoAvailable,
            DbSignal::HomePersonChanged => DbSignalKind::HomePersonChanged,
        }
    }

    fn shape(&self) -> ArgShape {
        match self {
            DbSignal::Added { .. } | DbSignal::Updated { .. } | DbSignal::Deleted { .. } => {
                ArgShape::KindHandle
            }
            DbSignal::Rebuilt { .. } => ArgShape::Kind,
            DbSignal::UndoAvailable(_) | DbSignal::RedoAvailable(_) => ArgShape::Label,
            DbSignal::HomePersonChanged => ArgShape::Unit,
        }
    }
}
