//! CLI command implementations.

pub mod history;
pub mod inspect;
pub mod upgrade;
pub mod verify;

use genedb_core::{Config, CoreError, Database};
use std::path::Path;

/// Opens an existing database without write access.
pub fn open_read_only(path: &Path) -> Result<Database, Box<dyn std::error::Error>> {
    let config = Config::new().read_only(true).create_if_missing(false);
    match Database::open_with_config(path, config) {
        Ok(db) => Ok(db),
        Err(CoreError::SchemaMismatch { found, expected }) if found < expected => Err(format!(
            "database at {} uses schema v{found}; run `genedb upgrade` first",
            path.display()
        )
        .into()),
        Err(e) => Err(e.into()),
    }
}
