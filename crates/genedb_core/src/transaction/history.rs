//! Bounded undo/redo history.

use super::UndoEntry;
use crate::types::{EntityKind, TransactionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// A committed transaction, as kept for undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedTransaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Label given at commit.
    pub label: String,
    /// Whether it was a batch transaction.
    pub batch: bool,
    /// Commit time, seconds since the Unix epoch.
    pub timestamp: i64,
    /// Mutations in the order they were made.
    pub entries: Vec<UndoEntry>,
}

impl CommittedTransaction {
    /// Record kinds touched, sorted.
    #[must_use]
    pub fn kinds(&self) -> BTreeSet<EntityKind> {
        self.entries.iter().map(|e| e.kind).collect()
    }
}

/// Result of an undo or redo request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The transaction with this label was reverted.
    Undone(String),
    /// The transaction with this label was reapplied.
    Redone(String),
    /// The undo stack was empty.
    NothingToUndo,
    /// The redo stack was empty.
    NothingToRedo,
}

impl UndoOutcome {
    /// Whether anything changed.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, UndoOutcome::Undone(_) | UndoOutcome::Redone(_))
    }
}

/// Undo and redo stacks.
///
/// Committing pushes onto the undo stack, dropping the oldest entry once
/// `capacity` is exceeded, and clears the redo stack.
#[derive(Debug)]
pub struct UndoHistory {
    undo: VecDeque<CommittedTransaction>,
    redo: Vec<CommittedTransaction>,
    capacity: usize,
}

impl UndoHistory {
    /// An empty history keeping at most `capacity` transactions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity,
        }
    }

    /// Maximum number of undoable transactions.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records a new commit.
    pub fn push(&mut self, txn: CommittedTransaction) {
        self.redo.clear();
        self.push_undo(txn);
    }

    /// Takes the most recent transaction for undo.
    pub fn pop_undo(&mut self) -> Option<CommittedTransaction> {
        self.undo.pop_back()
    }

    /// Takes the most recently undone transaction for redo.
    pub fn pop_redo(&mut self) -> Option<CommittedTransaction> {
        self.redo.pop()
    }

    /// Files an undone transaction for redo.
    pub fn push_redo(&mut self, txn: CommittedTransaction) {
        self.redo.push(txn);
    }

    /// Files a redone transaction for undo, keeping the redo stack.
    pub fn push_undo(&mut self, txn: CommittedTransaction) {
        self.undo.push_back(txn);
        while self.undo.len() > self.capacity {
            if let Some(dropped) = self.undo.pop_front() {
                debug!(txn = %dropped.id, label = %dropped.label, "undo history full, oldest dropped");
            }
        }
    }

    /// Label of the transaction undo would revert.
    #[must_use]
    pub fn undo_label(&self) -> Option<&str> {
        self.undo.back().map(|t| t.label.as_str())
    }

    /// Label of the transaction redo would reapply.
    #[must_use]
    pub fn redo_label(&self) -> Option<&str> {
        self.redo.last().map(|t| t.label.as_str())
    }

    /// Number of undoable transactions.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of redoable transactions.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Undoable transactions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &CommittedTransaction> + '_ {
        self.undo.iter()
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Replaces the undo stack with loaded transactions, oldest first.
    pub fn restore(&mut self, transactions: Vec<CommittedTransaction>) {
        self.clear();
        for txn in transactions {
            self.push_undo(txn);
        }
    }
}
