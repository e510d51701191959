//! Read-only views over a database.
//!
//! A [`Proxy`] wraps anything implementing [`DbRead`](crate::DbRead) and
//! presents a filtered, sanitized copy of it through the same interface, so
//! proxies can be stacked. Hidden records answer `NotFound`, references to
//! them are dropped from the records that remain visible, and every write is
//! refused with `ReadOnly`.
//!
//! ```rust
//! use genedb_core::proxy::PrivateProxyDb;
//! use genedb_core::{Database, DbRead, DbWrite, Name, Person};
//!
//! let db = Database::open_in_memory();
//! let hidden = db
//!     .with_transaction("add", false, |db, txn| {
//!         let mut p = Person::new(Name::new("Secret", "Agent"));
//!         p.private = true;
//!         db.add_person(p, txn)
//!     })
//!     .unwrap();
//!
//! let public = PrivateProxyDb::new(&db);
//! assert!(public.get_person_from_handle(hidden).is_err());
//! assert_eq!(public.number_of::<Person>(), 0);
//! ```

mod base;
mod filter;
mod private;

pub use base::{Proxy, ProxyFilter};
pub use filter::{FilterProxyDb, HandleFilter, KindFilter};
pub use private::{PrivateFilter, PrivateProxyDb};
