//! # GeneDB Core
//!
//! Embedded store for genealogical records.
//!
//! This crate provides:
//! - Typed records (people, families, events, places, sources,
//!   repositories, media, notes) cross-referenced by [`Handle`]
//! - Per-kind tables with a unique public-id index and a grouping index
//! - Transactions with a bounded undo/redo history
//! - Change signals delivered through a typed [`SignalBus`](signal::SignalBus)
//! - Read-only filtering and privacy proxies
//! - A directory format with schema migrations
//!
//! ## Example
//!
//! ```rust
//! use genedb_core::{Database, DbRead, DbWrite, Family, Name, Person, UndoOutcome};
//!
//! let db = Database::open_in_memory();
//! let (dad, family) = db
//!     .with_transaction("add family", false, |db, txn| {
//!         let dad = db.add_person(Person::new(Name::new("Tom", "Smith")), txn)?;
//!         let family = db.add_family(Family::new(Some(dad), None), txn)?;
//!         Ok((dad, family))
//!     })
//!     .unwrap();
//!
//! assert_eq!(db.find_backlink_handles(dad, None).len(), 1);
//! assert_eq!(db.undo().unwrap(), UndoOutcome::Undone("add family".into()));
//! assert!(db.get_family_from_handle(family).is_err());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod access;
mod config;
mod cursor;
mod database;
mod error;
pub mod index;
pub mod model;
pub mod persist;
pub mod proxy;
pub mod signal;
pub mod store;
pub mod transaction;
mod types;

pub use access::{DbRead, DbWrite};
pub use config::{Config, IdPrefix, DEFAULT_UNDO_HISTORY};
pub use cursor::Cursor;
pub use database::{DanglingReference, Database, DbSummary};
pub use error::{CoreError, CoreResult};
pub use model::{
    AnyRecord, Attribute, ChildRef, ChildRelation, Date, DateModifier, Event, EventRef, EventRole,
    EventType, Family, FamilyRelType, Gender, Handle, Media, MediaRef, Name, Note, NoteType,
    Person, PersonRef, Place, Record, RepoRef, Repository, RepositoryType, Source, SourceRef,
    Surname, Url,
};
pub use persist::SCHEMA_VERSION;
pub use signal::{DbSignal, DbSignalKind, ListenerId, SignalGate};
pub use transaction::{Transaction, UndoOutcome};
pub use types::{EntityKind, TransactionId};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
