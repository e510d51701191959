//! # GeneDB Testkit
//!
//! Test utilities for GeneDB.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - A small sample family tree
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use genedb_testkit::prelude::*;
//! use genedb_core::DbRead;
//!
//! with_temp_db(|db| {
//!     let tree = sample_tree(db);
//!     assert_eq!(db.get_person_from_handle(tree.child).unwrap().gramps_id, "I0002");
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
