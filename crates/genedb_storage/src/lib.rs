//! # GeneDB Storage
//!
//! Blob storage backends for GeneDB.
//!
//! Each persisted table of a GeneDB database (one per record kind, plus the
//! metadata table) lives in its own backend. Backends are **opaque blob
//! stores**: they load and replace a whole byte payload and never interpret
//! it.
//!
//! ## Design Principles
//!
//! - A `store` replaces the previous payload as a unit
//! - No knowledge of record kinds, CBOR or schema versions
//! - Must be `Send + Sync` so a database handle can cross threads
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral databases
//! - [`FileBackend`] - Write-temp-then-rename files on disk
//!
//! ## Example
//!
//! ```rust
//! use genedb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! assert!(backend.load().unwrap().is_none());
//! backend.store(b"people").unwrap();
//! assert_eq!(backend.load().unwrap().as_deref(), Some(&b"people"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
