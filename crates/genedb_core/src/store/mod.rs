//! In-memory record tables.
//!
//! One [`RecordStore`] per record kind, grouped in [`Tables`]. Every write
//! goes through [`RecordStore::apply`], which keeps the primary map and the
//! secondary indices in step. Normal commits, undo and redo all use it.

mod record_store;
mod tables;

pub use record_store::RecordStore;
pub use tables::Tables;

pub(crate) use tables::with_kind;
