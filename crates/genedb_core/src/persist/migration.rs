//! Schema migrations.
//!
//! Migrations rewrite stored records on the untyped [`Value`] level, since
//! an old payload no longer deserializes into the current record types.
//! Each migration upgrades the schema by exactly one version. The manager
//! rewrites every table first and stores the new version number last, so an
//! interrupted upgrade is picked up again on the next open. Migrations must
//! therefore be idempotent.

use super::dir::DatabaseDir;
use super::metadata::{Metadata, SCHEMA_VERSION};
use super::table::{load_raw, save_raw};
use crate::error::{CoreError, CoreResult};
use crate::model::Gender;
use crate::types::EntityKind;
use genedb_codec::value::field_mut;
use genedb_codec::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// One schema upgrade step.
pub trait Migration: Send + Sync {
    /// Version this migration upgrades from; it produces `from_version + 1`.
    fn from_version(&self) -> u32;

    /// Short name for logs.
    fn name(&self) -> &str;

    /// Kinds whose tables this migration rewrites.
    fn kinds(&self) -> &[EntityKind];

    /// Rewrites one stored record in place. Returns whether it changed.
    fn migrate(&self, kind: EntityKind, record: &mut Value) -> CoreResult<bool>;
}

/// Outcome of an upgrade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version before the upgrade.
    pub from_version: u32,
    /// Version after the upgrade.
    pub to_version: u32,
    /// Names of the migrations that ran, in order.
    pub applied: Vec<String>,
    /// Records rewritten.
    pub records_changed: usize,
}

/// Registry of migrations, keyed by the version they upgrade from.
pub struct MigrationManager {
    migrations: BTreeMap<u32, Box<dyn Migration>>,
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl MigrationManager {
    /// A manager with no migrations.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            migrations: BTreeMap::new(),
        }
    }

    /// A manager with every migration shipped with this crate.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut manager = Self::empty();
        manager.register(Box::new(GenderCodes));
        manager
    }

    /// Adds a migration, replacing any registered for the same version.
    pub fn register(&mut self, migration: Box<dyn Migration>) {
        self.migrations.insert(migration.from_version(), migration);
    }

    /// Names of the migrations that would run from `version`.
    #[must_use]
    pub fn pending(&self, version: u32) -> Vec<&str> {
        if version >= SCHEMA_VERSION {
            return Vec::new();
        }
        self.migrations
            .range(version..SCHEMA_VERSION)
            .map(|(_, m)| m.name())
            .collect()
    }

    /// Upgrades the directory from its stored version to
    /// [`SCHEMA_VERSION`].
    ///
    /// # Errors
    ///
    /// - `SchemaMismatch` if the stored version is newer than this build
    /// - `MigrationFailed` if a step between the two versions is missing or
    ///   a record cannot be rewritten
    pub fn run(&self, dir: &DatabaseDir) -> CoreResult<MigrationReport> {
        let mut metadata = Metadata::load(&dir.metadata_backend()?)?
            .ok_or_else(|| CoreError::invalid_format("database has no metadata"))?;
        let from = metadata.schema_version;
        if from > SCHEMA_VERSION {
            return Err(CoreError::SchemaMismatch {
                found: from,
                expected: SCHEMA_VERSION,
            });
        }

        let mut report = MigrationReport {
            from_version: from,
            to_version: from,
            ..MigrationReport::default()
        };
        if from == SCHEMA_VERSION {
            return Ok(report);
        }

        for version in from..SCHEMA_VERSION {
            let migration = self.migrations.get(&version).ok_or_else(|| {
                CoreError::migration_failed(format!("no migration from schema v{version}"))
            })?;
            info!(migration = migration.name(), from = version, "running migration");
            for &kind in migration.kinds() {
                let mut backend = dir.table_backend(kind)?;
                let mut records = load_raw(&backend)?;
                let mut changed = 0;
                for record in &mut records {
                    if migration.migrate(kind, record)? {
                        changed += 1;
                    }
                }
                if changed > 0 {
                    save_raw(records, &mut backend)?;
                }
                debug!(migration = migration.name(), %kind, changed, "table migrated");
                report.records_changed += changed;
            }
            report.applied.push(migration.name().to_string());
        }

        // Stored undo entries hold old-format records.
        let mut undo = dir.undo_backend()?;
        if genedb_storage::StorageBackend::exists(&undo) {
            genedb_storage::StorageBackend::remove(&mut undo)?;
        }
        // Tables and history are settled; the version is the final write.
        metadata.schema_version = SCHEMA_VERSION;
        metadata.store(&mut dir.metadata_backend()?)?;
        report.to_version = SCHEMA_VERSION;
        info!(from, to = SCHEMA_VERSION, records = report.records_changed, "upgrade complete");
        Ok(report)
    }
}

impl std::fmt::Debug for MigrationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.migrations.values().map(|m| m.name()))
            .finish()
    }
}

/// v1 → v2: person gender integer codes (0 female, 1 male, 2 unknown)
/// become text.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenderCodes;

impl Migration for GenderCodes {
    fn from_version(&self) -> u32 {
        1
    }

    fn name(&self) -> &str {
        "gender_codes_to_text"
    }

    fn kinds(&self) -> &[EntityKind] {
        &[EntityKind::Person]
    }

    fn migrate(&self, _kind: EntityKind, record: &mut Value) -> CoreResult<bool> {
        let Some(gender) = field_mut(record, "gender")? else {
            return Ok(false);
        };
        let Value::Integer(code) = gender else {
            return Ok(false);
        };
        let code = i64::try_from(i128::from(*code)).map_err(|_| {
            CoreError::migration_failed(format!("gender code out of range: {code:?}"))
        })?;
        *gender = Value::Text(Gender::from_legacy_code(code).as_str().to_string());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Person;
    use genedb_codec::value::field;
    use genedb_storage::StorageBackend;
    use tempfile::tempdir;

    fn legacy_person(code: u8) -> Value {
        Value::Map(vec![
            (Value::Text("handle".into()), Value::Text(crate::model::Handle::new().to_string())),
            (Value::Text("gramps_id".into()), Value::Text("I0001".into())),
            (Value::Text("gender".into()), Value::Integer(code.into())),
        ])
    }

    #[test]
    fn gender_codes_become_text() {
        let mut record = legacy_person(0);
        assert!(GenderCodes.migrate(EntityKind::Person, &mut record).unwrap());
        assert_eq!(
            field(&record, "gender").unwrap().and_then(Value::as_text),
            Some("female")
        );
        let person: Person = genedb_codec::from_value(record).unwrap();
        assert_eq!(person.gender, Gender::Female);
    }

    #[test]
    fn gender_migration_is_idempotent() {
        let mut record = legacy_person(1);
        GenderCodes.migrate(EntityKind::Person, &mut record).unwrap();
        assert!(!GenderCodes.migrate(EntityKind::Person, &mut record).unwrap());
    }

    #[test]
    fn pending_lists_steps() {
        let manager = MigrationManager::with_builtin();
        assert_eq!(manager.pending(1), vec!["gender_codes_to_text"]);
        assert!(manager.pending(SCHEMA_VERSION).is_empty());
    }

    #[test]
    fn run_upgrades_directory_and_writes_version_last() {
        let temp = tempdir().unwrap();
        let dir = DatabaseDir::open(temp.path(), true).unwrap();
        let mut meta = Metadata::new();
        meta.schema_version = 1;
        meta.store(&mut dir.metadata_backend().unwrap()).unwrap();
        save_raw(
            vec![legacy_person(1), legacy_person(2)],
            &mut dir.table_backend(EntityKind::Person).unwrap(),
        )
        .unwrap();

        let report = MigrationManager::with_builtin().run(&dir).unwrap();
        assert_eq!(report.from_version, 1);
        assert_eq!(report.to_version, 2);
        assert_eq!(report.records_changed, 2);

        let meta = Metadata::load(&dir.metadata_backend().unwrap()).unwrap().unwrap();
        assert_eq!(meta.schema_version, SCHEMA_VERSION);
        let rows = load_raw(&dir.table_backend(EntityKind::Person).unwrap()).unwrap();
        assert_eq!(
            field(&rows[1], "gender").unwrap().and_then(Value::as_text),
            Some("unknown")
        );
        assert!(!dir.undo_backend().unwrap().exists());
    }

    #[test]
    fn unremovable_history_keeps_old_version() {
        let temp = tempdir().unwrap();
        let dir = DatabaseDir::open(temp.path(), true).unwrap();
        let mut meta = Metadata::new();
        meta.schema_version = 1;
        meta.store(&mut dir.metadata_backend().unwrap()).unwrap();
        save_raw(
            vec![legacy_person(0)],
            &mut dir.table_backend(EntityKind::Person).unwrap(),
        )
        .unwrap();
        std::fs::create_dir(dir.undo_path()).unwrap();

        assert!(MigrationManager::with_builtin().run(&dir).is_err());
        let meta = Metadata::load(&dir.metadata_backend().unwrap()).unwrap().unwrap();
        assert_eq!(meta.schema_version, 1);
    }

    #[test]
    fn missing_step_fails() {
        let temp = tempdir().unwrap();
        let dir = DatabaseDir::open(temp.path(), true).unwrap();
        let mut meta = Metadata::new();
        meta.schema_version = 0;
        meta.store(&mut dir.metadata_backend().unwrap()).unwrap();
        assert!(matches!(
            MigrationManager::with_builtin().run(&dir),
            Err(CoreError::MigrationFailed { .. })
        ));
    }

    #[test]
    fn newer_schema_is_rejected() {
        let temp = tempdir().unwrap();
        let dir = DatabaseDir::open(temp.path(), true).unwrap();
        let mut meta = Metadata::new();
        meta.schema_version = SCHEMA_VERSION + 1;
        meta.store(&mut dir.metadata_backend().unwrap()).unwrap();
        assert!(matches!(
            MigrationManager::with_builtin().run(&dir),
            Err(CoreError::SchemaMismatch { .. })
        ));
    }
}
