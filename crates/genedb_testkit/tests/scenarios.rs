//! End-to-end scenarios over the public API.

use genedb_codec::value::set_field;
use genedb_codec::Value;
use genedb_core::persist::{save_raw, DatabaseDir, Metadata};
use genedb_core::proxy::{FilterProxyDb, HandleFilter, KindFilter, PrivateProxyDb};
use genedb_core::{
    CoreError, Database, DbRead, DbSignal, DbSignalKind, DbWrite, EntityKind, Gender, Name, Note,
    Person, UndoOutcome, SCHEMA_VERSION,
};
use genedb_testkit::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn add_and_undo_by_id() {
    with_temp_db(|db| {
        db.with_transaction("add", false, |db, txn| {
            db.add_person(Person::new(Name::new("Ann", "Lee")), txn)
        })
        .unwrap();
        assert!(db.has_id::<Person>("I0000"));

        assert_eq!(db.undo().unwrap(), UndoOutcome::Undone("add".into()));
        assert!(db.get_person_from_id("I0000").unwrap_err().is_not_found());

        db.redo().unwrap();
        assert_eq!(
            db.get_person_from_id("I0000").unwrap().primary_name.first_name,
            "Ann"
        );
    });
}

#[test]
fn id_change_moves_resolution_and_undoes() {
    with_temp_db(|db| {
        let tree = sample_tree(db);
        db.with_transaction("renumber", false, |db, txn| {
            let mut p = db.get_person_from_handle(tree.child)?;
            p.gramps_id = "I0100".into();
            db.commit_person(p, txn)
        })
        .unwrap();
        assert!(db.get_person_from_id("I0002").is_err());
        assert_eq!(db.get_person_from_id("I0100").unwrap().handle, Some(tree.child));

        db.undo().unwrap();
        assert!(db.get_person_from_id("I0100").is_err());
        assert_eq!(db.get_person_from_id("I0002").unwrap().handle, Some(tree.child));
    });
}

#[test]
fn undo_of_whole_tree_empties_every_table() {
    with_temp_db(|db| {
        sample_tree(db);
        db.undo().unwrap();
        for kind in EntityKind::ALL {
            assert_eq!(db.count(kind), 0, "{kind} table not empty");
        }
        assert!(db.surnames().is_empty());
    });
}

#[test]
fn removing_referenced_person_keeps_referrers() {
    with_temp_db(|db| {
        let tree = sample_tree(db);
        let before = db.find_backlink_handles(tree.father, None);
        assert_eq!(before, vec![(EntityKind::Family, tree.family)]);

        db.with_transaction("remove father", false, |db, txn| {
            db.remove_person(tree.father, txn)
        })
        .unwrap();

        let family = db.get_family_from_handle(tree.family).unwrap();
        assert_eq!(family.father_handle, Some(tree.father));
        assert_eq!(db.find_backlink_handles(tree.father, None), before);
        assert_eq!(db.dangling_references().len(), 1);
    });
}

#[test]
fn checked_remove_reports_referrers() {
    with_temp_db(|db| {
        let tree = sample_tree(db);
        let mut txn = db.transaction_begin(false).unwrap();
        let err = db.remove_checked::<Person>(tree.father, &mut txn).unwrap_err();
        assert!(matches!(err, CoreError::ReferentialDangling { .. }));
        db.transaction_abort(txn).unwrap();
    });
}

#[test]
fn proxy_hides_excluded_handle_and_nulls_father() {
    with_temp_db(|db| {
        let tree = sample_tree(db);
        let filters = KindFilter::new().with(
            EntityKind::Person,
            HandleFilter::Except([tree.father].into_iter().collect()),
        );
        let proxy = FilterProxyDb::new(db, filters);

        assert!(proxy.get_person_from_handle(tree.father).unwrap_err().is_not_found());
        assert!(!proxy.get_person_handles(true).contains(&tree.father));

        let family = proxy.get_family_from_handle(tree.family).unwrap();
        assert_eq!(family.father_handle, None);
        assert_eq!(family.mother_handle, Some(tree.mother));
        assert!(proxy.find_backlink_handles(tree.father, None).is_empty());

        let private = PrivateProxyDb::new(&proxy);
        assert_eq!(private.number_of::<Person>(), 2);
        assert!(matches!(private.transaction_begin(false), Err(CoreError::ReadOnly { .. })));
    });
}

#[test]
fn nested_begin_is_rejected() {
    with_temp_db(|db| {
        let _outer = db.transaction_begin(false).unwrap();
        assert!(matches!(
            db.transaction_begin(true),
            Err(CoreError::InvalidTransition { .. })
        ));
    });
}

#[test]
fn listener_panic_is_isolated() {
    with_temp_db(|db| {
        let delivered = Arc::new(AtomicUsize::new(0));
        db.connect(DbSignalKind::Added, |_| panic!("listener failure")).unwrap();
        let counter = Arc::clone(&delivered);
        db.connect(DbSignalKind::Added, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let tree = sample_tree(db);
        assert_eq!(delivered.load(Ordering::SeqCst), 6);
        assert!(db.has_handle(EntityKind::Person, tree.child));
    });
}

#[test]
fn listener_commits_from_inside_a_signal() {
    let db = Arc::new(Database::open_in_memory());
    let results = Arc::new(Mutex::new(Vec::new()));
    let labels = Arc::new(Mutex::new(Vec::new()));

    let weak = Arc::downgrade(&db);
    let sink = Arc::clone(&results);
    db.connect(DbSignalKind::Added, move |s| {
        let Some(db) = weak.upgrade() else { return };
        if s.entity_kind() == Some(EntityKind::Person) {
            let result = db.with_transaction("audit", false, |db, txn| {
                db.add_note(Note::new("person added"), txn)
            });
            sink.lock().unwrap().push(result.is_ok());
        }
    })
    .unwrap();
    let sink = Arc::clone(&labels);
    db.connect(DbSignalKind::UndoAvailable, move |s| {
        if let DbSignal::UndoAvailable(label) = s {
            sink.lock().unwrap().push(label.clone());
        }
    })
    .unwrap();

    db.with_transaction("add", false, |db, txn| {
        db.add_person(Person::new(Name::new("Ann", "Lee")), txn)
    })
    .unwrap();

    assert_eq!(*results.lock().unwrap(), vec![true]);
    assert_eq!(db.number_of::<Note>(), 1);
    assert_eq!(db.undo_label().as_deref(), Some("audit"));
    assert_eq!(
        *labels.lock().unwrap(),
        vec![Some("audit".to_string()), Some("audit".to_string())]
    );

    assert_eq!(db.undo().unwrap(), UndoOutcome::Undone("audit".into()));
    assert_eq!(db.number_of::<Note>(), 0);
    assert_eq!(db.undo().unwrap(), UndoOutcome::Undone("add".into()));
    assert_eq!(db.number_of::<Person>(), 0);
}

#[test]
fn signals_for_sample_tree() {
    with_temp_db(|db| {
        let log = record_signals(db);
        sample_tree(db);
        let log = log.lock().unwrap();
        let added = log.iter().filter(|s| matches!(s, DbSignal::Added { .. })).count();
        let updated = log.iter().filter(|s| matches!(s, DbSignal::Updated { .. })).count();
        // Three people are added and then committed again within the same
        // transaction, so each one yields an Added and an Updated signal.
        assert_eq!(added, 6);
        assert_eq!(updated, 3);
        assert_eq!(log[log.len() - 2], DbSignal::UndoAvailable(Some("sample tree".into())));
        assert_eq!(log[log.len() - 1], DbSignal::RedoAvailable(None));
    });
}

#[test]
fn persistence_round_trip() {
    let test_db = TestDatabase::file();
    let tree = sample_tree(&test_db);
    let before = snapshot_people(&test_db);

    let test_db = test_db.reopen();
    assert_eq!(snapshot_people(&test_db), before);
    assert_eq!(test_db.undo_label().as_deref(), Some("sample tree"));
    assert_eq!(test_db.find_next_id(EntityKind::Person), "I0003");
    assert_eq!(
        test_db.find_backlink_handles(tree.place, None),
        vec![(EntityKind::Event, tree.birth)]
    );
}

#[test]
fn v1_directory_upgrades_on_open() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("legacy");
    let handle = genedb_core::Handle::new();
    {
        let dir = DatabaseDir::open(&path, true).unwrap();
        let mut person =
            genedb_codec::to_value(&Person::new(Name::new("Old", "Timer"))).unwrap();
        set_field(&mut person, "handle", Value::Text(handle.to_string())).unwrap();
        set_field(&mut person, "gramps_id", Value::Text("I0007".into())).unwrap();
        set_field(&mut person, "gender", Value::Integer(1.into())).unwrap();
        save_raw(vec![person], &mut dir.table_backend(EntityKind::Person).unwrap()).unwrap();

        let mut metadata = Metadata::new();
        metadata.schema_version = 1;
        metadata.store(&mut dir.metadata_backend().unwrap()).unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.summary().schema_version, SCHEMA_VERSION);
    let person = db.get_person_from_id("I0007").unwrap();
    assert_eq!(person.handle, Some(handle));
    assert_eq!(person.gender, Gender::Male);
}

#[test]
fn upgrade_can_be_refused() {
    let temp = tempfile::tempdir().unwrap();
    {
        let dir = DatabaseDir::open(temp.path(), true).unwrap();
        let mut metadata = Metadata::new();
        metadata.schema_version = 1;
        metadata.store(&mut dir.metadata_backend().unwrap()).unwrap();
    }
    let config = genedb_core::Config::new().auto_upgrade(false);
    assert!(matches!(
        Database::open_with_config(temp.path(), config),
        Err(CoreError::SchemaMismatch { found: 1, .. })
    ));
}
