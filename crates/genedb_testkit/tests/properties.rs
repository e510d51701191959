//! Property tests over random mutation scripts.

use genedb_core::{Database, DbRead, DbSignal, DbWrite, EntityKind, Person};
use genedb_testkit::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Public ids of every kind, every person and the number of events.
fn state(db: &Database) -> (Vec<Vec<String>>, Vec<Person>, usize) {
    let ids = EntityKind::ALL.iter().map(|kind| db.ids(*kind)).collect();
    (ids, snapshot_people(db), db.count(EntityKind::Event))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn undo_restores_and_redo_reapplies(
        seed in ops_strategy(6),
        ops in ops_strategy(12),
    ) {
        let db = Database::open_in_memory();
        apply_ops(&db, "seed", false, &seed).unwrap();
        let before = state(&db);

        apply_ops(&db, "script", false, &ops).unwrap();
        let after = state(&db);

        if db.undo_label().as_deref() == Some("script") {
            db.undo().unwrap();
            prop_assert_eq!(state(&db), before);
            db.redo().unwrap();
        }
        prop_assert_eq!(state(&db), after);
    }

    #[test]
    fn added_people_resolve_by_handle_and_id(people in prop::collection::vec(person_strategy(), 1..10)) {
        let db = Database::open_in_memory();
        let handles = db
            .with_transaction("add", false, |db, txn| {
                people.iter().cloned().map(|p| db.add_person(p, txn)).collect::<Result<Vec<_>, _>>()
            })
            .unwrap();
        for (handle, original) in handles.iter().zip(&people) {
            let stored = db.get_person_from_handle(*handle).unwrap();
            prop_assert_eq!(&stored.primary_name, &original.primary_name);
            prop_assert_eq!(db.get_person_from_id(&stored.gramps_id).unwrap(), stored);
        }
        let ids: BTreeSet<_> = db.ids(EntityKind::Person).into_iter().collect();
        prop_assert_eq!(ids.len(), people.len());
    }

    #[test]
    fn batch_emits_one_rebuilt_per_kind(ops in ops_strategy(12)) {
        let db = Database::open_in_memory();
        apply_ops(&db, "seed", false, &ops).unwrap();
        let log = record_signals(&db);
        apply_ops(&db, "batch", true, &ops).unwrap();

        let txn = db.history().pop();
        let log = log.lock().unwrap();
        match txn.filter(|t| t.label == "batch") {
            Some(txn) => {
                let rebuilt: Vec<_> = log
                    .iter()
                    .filter_map(|s| match s {
                        DbSignal::Rebuilt { kind } => Some(*kind),
                        _ => None,
                    })
                    .collect();
                prop_assert_eq!(rebuilt, txn.kinds().into_iter().collect::<Vec<_>>());
                prop_assert_eq!(log.len(), txn.kinds().len() + 2);
            }
            None => prop_assert!(log.is_empty()),
        }
    }

    #[test]
    fn fine_grained_signal_per_mutation(ops in ops_strategy(12)) {
        let db = Database::open_in_memory();
        let log = record_signals(&db);
        apply_ops(&db, "script", false, &ops).unwrap();

        let changes = log
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.handle().is_some())
            .count();
        let entries = db.history().last().map_or(0, |t| t.entries.len());
        prop_assert_eq!(changes, entries);
    }
}
