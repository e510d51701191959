//! Transactions and the undo log.
//!
//! A [`Transaction`] buffers every mutation as an [`UndoEntry`] holding the
//! serialized record before and after the change. Nothing reaches the
//! record tables until the transaction is committed; the committed
//! transaction then becomes one step of the [`UndoHistory`]. Undo replays
//! the `prior` values backward, redo the `new` values forward, both through
//! the same apply path as a normal commit.

mod history;
mod state;

pub use history::{CommittedTransaction, UndoHistory, UndoOutcome};
pub use state::{Transaction, TransactionState, UndoEntry, UndoOp};
