//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use genedb_core::{
    Config, Database, DbRead, DbSignal, DbSignalKind, DbWrite, Event, EventRef, EventType, Family,
    Gender, Handle, Name, Person, Place,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A test database with automatic cleanup.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestDatabase {
    /// Creates a new in-memory test database.
    pub fn memory() -> Self {
        Self {
            db: Database::open_in_memory(),
            temp_dir: None,
        }
    }

    /// Creates a new directory-backed test database.
    pub fn file() -> Self {
        Self::file_with_config(Config::default())
    }

    /// Creates a new directory-backed test database with custom configuration.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_with_config(&temp_dir.path().join("tree"), config)
            .expect("Failed to open file database");
        Self {
            db,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the database path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join("tree"))
    }

    /// Closes and reopens a file-based database with the default
    /// configuration.
    pub fn reopen(self) -> Self {
        let Self { db, temp_dir } = self;
        let temp_dir = temp_dir.expect("Only file databases can be reopened");
        db.close().expect("Failed to close database");
        let db = Database::open(&temp_dir.path().join("tree")).expect("Failed to reopen database");
        Self {
            db,
            temp_dir: Some(temp_dir),
        }
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory database.
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Runs a test with a temporary directory-backed database.
pub fn with_file_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let test_db = TestDatabase::file();
    let path = test_db.path().expect("File database should have a path");
    f(&test_db.db, &path)
}

/// Handles of the records created by [`sample_tree`].
#[derive(Debug, Clone, Copy)]
pub struct SampleTree {
    /// `I0000`, married to `mother`.
    pub father: Handle,
    /// `I0001`.
    pub mother: Handle,
    /// `I0002`, child of `family`.
    pub child: Handle,
    /// `F0000`.
    pub family: Handle,
    /// Birth of the child.
    pub birth: Handle,
    /// Where the child was born.
    pub place: Handle,
}

/// Adds two parents, a child, their family, the child's birth and its
/// place in one transaction labelled `"sample tree"`.
pub fn sample_tree(db: &Database) -> SampleTree {
    db.with_transaction("sample tree", false, |db, txn| {
        let father = db.add_person(
            Person::new(Name::new("John", "Smith")).with_gender(Gender::Male),
            txn,
        )?;
        let mother = db.add_person(
            Person::new(Name::new("Mary", "Jones")).with_gender(Gender::Female),
            txn,
        )?;

        let place = db.add_place(Place::new("Springfield"), txn)?;
        let birth = db.add_event(
            Event::new(EventType::Birth)
                .with_date(genedb_core::Date::ymd(1900, 5, 17))
                .with_place(place),
            txn,
        )?;

        let mut child = Person::new(Name::new("Alice", "Smith")).with_gender(Gender::Female);
        let index = child.add_event_ref(EventRef::new(birth));
        child.birth_ref_index = Some(index);
        let child = db.add_person(child, txn)?;

        let mut family = Family::new(Some(father), Some(mother));
        family.add_child(child);
        let family = db.add_family(family, txn)?;

        for (handle, as_parent) in [(father, true), (mother, true), (child, false)] {
            let mut p = db.get_in_txn::<Person>(handle, txn)?;
            if as_parent {
                p.family_list.push(family);
            } else {
                p.parent_family_list.push(family);
            }
            db.commit_person(p, txn)?;
        }

        Ok(SampleTree {
            father,
            mother,
            child,
            family,
            birth,
            place,
        })
    })
    .expect("Failed to build sample tree")
}

/// Records every database signal delivered after the call.
pub fn record_signals(db: &Database) -> Arc<Mutex<Vec<DbSignal>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        DbSignalKind::Added,
        DbSignalKind::Updated,
        DbSignalKind::Deleted,
        DbSignalKind::Rebuilt,
        DbSignalKind::UndoAvailable,
        DbSignalKind::RedoAvailable,
    ] {
        let log = Arc::clone(&log);
        db.connect(kind, move |s| log.lock().expect("signal log poisoned").push(s.clone()))
            .expect("Failed to connect listener");
    }
    log
}

/// Every live person, in handle order, for before/after comparisons.
pub fn snapshot_people(db: &Database) -> Vec<Person> {
    let mut people: Vec<Person> = db
        .get_person_handles(false)
        .into_iter()
        .map(|h| db.get_person_from_handle(h).expect("listed handle must resolve"))
        .collect();
    people.sort_by_key(|p| p.handle);
    people
}
