//! Transaction state.

use crate::error::{CoreError, CoreResult};
use crate::model::Handle;
use crate::signal::SuppressionGuard;
use crate::types::{EntityKind, TransactionId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Accepting mutations.
    Open,
    /// Applied and recorded in the history.
    Committed,
    /// Discarded.
    Aborted,
}

/// What a buffered mutation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UndoOp {
    /// The record did not exist before.
    Create,
    /// The record existed before and after.
    Update,
    /// The record was removed.
    Delete,
}

/// One buffered mutation: the serialized record before and after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoEntry {
    /// Kind of the record.
    pub kind: EntityKind,
    /// Handle of the record.
    pub handle: Handle,
    /// Operation.
    pub op: UndoOp,
    /// Record before the mutation, `None` for a create.
    pub prior: Option<Vec<u8>>,
    /// Record after the mutation, `None` for a delete.
    pub new: Option<Vec<u8>>,
}

/// Latest buffered version of a record.
#[derive(Debug, Clone)]
struct Pending {
    id: String,
    bytes: Vec<u8>,
}

/// An open unit of work.
///
/// Mutations are validated when they are made and buffered until
/// [`Database::transaction_commit`](crate::Database::transaction_commit).
/// Only one transaction may be open per database; dropping an open
/// transaction aborts it.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    db: Uuid,
    batch: bool,
    state: TransactionState,
    entries: Vec<UndoEntry>,
    /// `(kind, handle)` -> latest buffered version, `None` when removed.
    pending: HashMap<(EntityKind, Handle), Option<Pending>>,
    /// `(kind, id)` -> handle claiming the id, `None` when released.
    claims: HashMap<(EntityKind, String), Option<Handle>>,
    slot: Arc<Mutex<Option<TransactionId>>>,
    _suppression: Option<SuppressionGuard>,
}

impl Transaction {
    pub(crate) fn new(
        id: TransactionId,
        db: Uuid,
        batch: bool,
        slot: Arc<Mutex<Option<TransactionId>>>,
        suppression: Option<SuppressionGuard>,
    ) -> Self {
        Self {
            id,
            db,
            batch,
            state: TransactionState::Open,
            entries: Vec::new(),
            pending: HashMap::new(),
            claims: HashMap::new(),
            slot,
            _suppression: suppression,
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Whether this is a batch transaction.
    #[must_use]
    pub fn is_batch(&self) -> bool {
        self.batch
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Whether the transaction still accepts mutations.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == TransactionState::Open
    }

    /// Buffered mutations, in order.
    #[must_use]
    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    /// Number of buffered mutations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Latest buffered bytes of a record: `None` if untouched,
    /// `Some(None)` if removed in this transaction.
    #[must_use]
    pub fn pending(&self, kind: EntityKind, handle: Handle) -> Option<Option<&[u8]>> {
        self.pending
            .get(&(kind, handle))
            .map(|p| p.as_ref().map(|p| p.bytes.as_slice()))
    }

    /// Latest buffered public id of a record, same convention as
    /// [`Transaction::pending`].
    #[must_use]
    pub fn pending_id(&self, kind: EntityKind, handle: Handle) -> Option<Option<&str>> {
        self.pending
            .get(&(kind, handle))
            .map(|p| p.as_ref().map(|p| p.id.as_str()))
    }

    /// Buffered owner of a public id: `None` if the transaction never
    /// touched the id, `Some(None)` if it released it.
    #[must_use]
    pub fn id_claim(&self, kind: EntityKind, id: &str) -> Option<Option<Handle>> {
        self.claims.get(&(kind, id.to_string())).copied()
    }

    /// Every record with a buffered live version, as
    /// `(kind, handle, bytes)`.
    pub fn pending_records(&self) -> impl Iterator<Item = (EntityKind, Handle, &[u8])> + '_ {
        self.pending
            .iter()
            .filter_map(|((kind, handle), p)| p.as_ref().map(|p| (*kind, *handle, p.bytes.as_slice())))
    }

    pub(crate) fn check_owner(&self, db: Uuid) -> CoreResult<()> {
        if self.db != db {
            return Err(CoreError::invalid_transition(format!(
                "{} belongs to another database",
                self.id
            )));
        }
        self.ensure_open()
    }

    pub(crate) fn ensure_open(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Open => Ok(()),
            TransactionState::Committed => {
                Err(CoreError::invalid_transition(format!("{} already committed", self.id)))
            }
            TransactionState::Aborted => {
                Err(CoreError::invalid_transition(format!("{} already aborted", self.id)))
            }
        }
    }

    /// Buffers a mutation. `old_id` is the public id before the mutation,
    /// `new_id` the one after.
    pub(crate) fn record(&mut self, entry: UndoEntry, old_id: Option<String>, new_id: Option<String>) {
        let key = (entry.kind, entry.handle);
        if let Some(old) = old_id.filter(|id| !id.is_empty()) {
            self.claims.insert((entry.kind, old), None);
        }
        let pending = match (&entry.new, new_id) {
            (Some(bytes), Some(id)) => {
                if !id.is_empty() {
                    self.claims.insert((entry.kind, id.clone()), Some(entry.handle));
                }
                Some(Pending {
                    id,
                    bytes: bytes.clone(),
                })
            }
            _ => None,
        };
        self.pending.insert(key, pending);
        self.entries.push(entry);
    }

    /// Marks the transaction finished and hands out its entries.
    pub(crate) fn finish(&mut self, state: TransactionState) -> Vec<UndoEntry> {
        self.state = state;
        self.pending.clear();
        self.claims.clear();
        self._suppression = None;
        self.release();
        std::mem::take(&mut self.entries)
    }

    fn release(&self) {
        let mut slot = self.slot.lock();
        if *slot == Some(self.id) {
            *slot = None;
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.state == TransactionState::Open {
            tracing::debug!(txn = %self.id, entries = self.entries.len(), "open transaction dropped");
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_txn() -> (Transaction, Arc<Mutex<Option<TransactionId>>>) {
        let slot = Arc::new(Mutex::new(Some(TransactionId::new(1))));
        let txn = Transaction::new(TransactionId::new(1), Uuid::nil(), false, Arc::clone(&slot), None);
        (txn, slot)
    }

    fn entry(handle: Handle, prior: Option<u8>, new: Option<u8>) -> UndoEntry {
        let op = match (prior, new) {
            (None, _) => UndoOp::Create,
            (_, None) => UndoOp::Delete,
            _ => UndoOp::Update,
        };
        UndoEntry {
            kind: EntityKind::Person,
            handle,
            op,
            prior: prior.map(|b| vec![b]),
            new: new.map(|b| vec![b]),
        }
    }

    #[test]
    fn new_transaction_is_open() {
        let (txn, _) = create_txn();
        assert!(txn.is_open());
        assert!(txn.is_empty());
        assert!(txn.check_owner(Uuid::nil()).is_ok());
        assert!(txn.check_owner(Uuid::new_v4()).is_err());
    }

    #[test]
    fn record_tracks_pending_and_claims() {
        let (mut txn, _) = create_txn();
        let h = Handle::new();
        txn.record(entry(h, None, Some(1)), None, Some("I0001".into()));
        assert_eq!(txn.pending(EntityKind::Person, h), Some(Some(&[1u8][..])));
        assert_eq!(txn.id_claim(EntityKind::Person, "I0001"), Some(Some(h)));

        txn.record(entry(h, Some(1), Some(2)), Some("I0001".into()), Some("I0002".into()));
        assert_eq!(txn.id_claim(EntityKind::Person, "I0001"), Some(None));
        assert_eq!(txn.pending_id(EntityKind::Person, h), Some(Some("I0002")));

        txn.record(entry(h, Some(2), None), Some("I0002".into()), None);
        assert_eq!(txn.pending(EntityKind::Person, h), Some(None));
        assert_eq!(txn.id_claim(EntityKind::Person, "I0002"), Some(None));
        assert_eq!(txn.len(), 3);
    }

    #[test]
    fn finish_releases_slot() {
        let (mut txn, slot) = create_txn();
        txn.record(entry(Handle::new(), None, Some(1)), None, None);
        let entries = txn.finish(TransactionState::Committed);
        assert_eq!(entries.len(), 1);
        assert!(slot.lock().is_none());
        assert!(txn.ensure_open().is_err());
    }

    #[test]
    fn drop_releases_slot() {
        let (txn, slot) = create_txn();
        drop(txn);
        assert!(slot.lock().is_none());
    }
}
