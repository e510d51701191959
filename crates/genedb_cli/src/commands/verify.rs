//! Verify command implementation.

use super::open_read_only;
use genedb_core::{DanglingReference, Database, DbRead, EntityKind};
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of records checked.
    pub records_checked: usize,
    /// References to records that do not exist.
    pub dangling: Vec<DanglingReference>,
    /// Records whose public id does not resolve back to them.
    pub id_errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.dangling.is_empty() && self.id_errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying database at {}", path.display());
    println!();

    let db = open_read_only(path)?;
    let result = verify(&db);

    println!("  Records checked: {}", result.records_checked);
    for d in &result.dangling {
        println!(
            "  {} {} -> missing {} {}",
            d.owner_kind, d.owner, d.target_kind, d.target
        );
    }
    for e in &result.id_errors {
        println!("  {e}");
    }

    println!();
    if result.is_ok() {
        println!("✓ Database verification passed");
        Ok(())
    } else {
        println!("✗ Database verification failed");
        Err("Verification failed".into())
    }
}

/// Checks every reference and every public id.
pub fn verify(db: &Database) -> VerifyResult {
    let mut result = VerifyResult {
        dangling: db.dangling_references(),
        ..VerifyResult::default()
    };
    for kind in EntityKind::ALL {
        for id in db.ids(kind) {
            result.records_checked += 1;
            if !resolves(db, kind, &id) {
                result.id_errors.push(format!("{kind} id {id} does not resolve"));
            }
        }
        result.records_checked += db.count(kind).saturating_sub(db.ids(kind).len());
    }
    result
}

fn resolves(db: &Database, kind: EntityKind, id: &str) -> bool {
    use genedb_core::{Event, Family, Media, Note, Person, Place, Repository, Source};
    match kind {
        EntityKind::Person => db.has_id::<Person>(id),
        EntityKind::Family => db.has_id::<Family>(id),
        EntityKind::Event => db.has_id::<Event>(id),
        EntityKind::Place => db.has_id::<Place>(id),
        EntityKind::Source => db.has_id::<Source>(id),
        EntityKind::Repository => db.has_id::<Repository>(id),
        EntityKind::Media => db.has_id::<Media>(id),
        EntityKind::Note => db.has_id::<Note>(id),
    }
}
