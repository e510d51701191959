//! Upgrade command implementation.

use genedb_core::persist::{DatabaseDir, Metadata, MigrationManager};
use genedb_core::SCHEMA_VERSION;
use std::path::Path;
use tracing::info;

/// Runs pending migrations.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    info!("Checking schema of {}", path.display());

    let dir = DatabaseDir::open(path, false)?;
    let metadata = Metadata::load(&dir.metadata_backend()?)?
        .ok_or_else(|| format!("No database found at {}", path.display()))?;
    let manager = MigrationManager::with_builtin();
    let pending = manager.pending(metadata.schema_version);

    println!("Schema Status");
    println!("=============");
    println!("  Database version: v{}", metadata.schema_version);
    println!("  Current version:  v{SCHEMA_VERSION}");

    if pending.is_empty() {
        println!("\nNothing to upgrade.");
        return Ok(());
    }

    println!("\nPending Migrations:");
    for name in &pending {
        println!("  ○ {name}");
    }

    if dry_run {
        println!("\n(dry run - no changes made)");
        return Ok(());
    }

    let report = manager.run(&dir)?;
    println!(
        "\n✓ Upgraded v{} -> v{}: {} record(s) changed",
        report.from_version, report.to_version, report.records_changed
    );
    Ok(())
}
