//! On-disk persistence.
//!
//! A database directory looks like this:
//!
//! ```text
//! <db_path>/
//! ├─ LOCK            # Advisory lock for single-process access
//! ├─ metadata.cbor   # Schema version and id counters, written last
//! ├─ undo.cbor       # Undo history
//! ├─ person.cbor     # One CBOR array of records per kind
//! ├─ family.cbor
//! └─ ...
//! ```
//!
//! Every file is replaced atomically through
//! [`FileBackend`](genedb_storage::FileBackend).

mod dir;
mod metadata;
mod migration;
mod table;

pub use dir::DatabaseDir;
pub use metadata::{Metadata, SCHEMA_VERSION};
pub use migration::{GenderCodes, Migration, MigrationManager, MigrationReport};
pub use table::{load_history, load_raw, load_table, save_history, save_raw, save_table};
