//! Property-based test generators using proptest.
//!
//! Provides strategies for generating records and mutation scripts.

use genedb_core::{
    Attribute, Database, Date, DateModifier, DbRead, DbWrite, Event, EventType, Gender, Handle,
    Name, Person,
};
use proptest::prelude::*;

/// Strategy for generating given names.
pub fn first_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{1,9}").expect("Invalid regex")
}

/// Strategy for generating surnames from a small pool, so groups collide.
pub fn surname_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Smith", "Jones", "Brown", "Taylor", "Wilson", "Evans"])
        .prop_map(str::to_string)
}

/// Strategy for generating a gender.
pub fn gender_strategy() -> impl Strategy<Value = Gender> {
    prop_oneof![Just(Gender::Female), Just(Gender::Male), Just(Gender::Unknown)]
}

/// Strategy for generating dates, including partial ones.
pub fn date_strategy() -> impl Strategy<Value = Date> {
    (
        prop_oneof![
            Just(DateModifier::None),
            Just(DateModifier::About),
            Just(DateModifier::Before),
            Just(DateModifier::After),
        ],
        1500i32..2020,
        0u8..=12,
        0u8..=28,
    )
        .prop_map(|(modifier, year, month, day)| {
            let day = if month == 0 { 0 } else { day };
            Date {
                modifier,
                year,
                month,
                day,
            }
        })
}

/// Strategy for generating a person without references.
pub fn person_strategy() -> impl Strategy<Value = Person> {
    (
        first_name_strategy(),
        surname_strategy(),
        gender_strategy(),
        any::<bool>(),
        prop::collection::vec(("[a-z]{1,8}", "[a-z0-9 ]{0,12}"), 0..3),
    )
        .prop_map(|(first, surname, gender, private, attrs)| {
            let mut person = Person::new(Name::new(first, surname)).with_gender(gender);
            person.private = private;
            person.attribute_list = attrs
                .into_iter()
                .map(|(k, v)| Attribute::new(k, v))
                .collect();
            person
        })
}

/// Strategy for generating an event without references.
pub fn event_strategy() -> impl Strategy<Value = Event> {
    (
        prop_oneof![
            Just(EventType::Birth),
            Just(EventType::Death),
            Just(EventType::Marriage),
            Just(EventType::Census),
        ],
        date_strategy(),
    )
        .prop_map(|(event_type, date)| Event::new(event_type).with_date(date))
}

/// One step of a mutation script.
#[derive(Debug, Clone)]
pub enum Op {
    /// Add a person.
    AddPerson(Person),
    /// Add an event.
    AddEvent(Event),
    /// Rename the n-th live person (modulo count).
    Rename(usize, String),
    /// Give the n-th live person a new public id.
    ChangeId(usize, u16),
    /// Remove the n-th live person.
    RemovePerson(usize),
}

/// Strategy for generating a single mutation.
pub fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => person_strategy().prop_map(Op::AddPerson),
        1 => event_strategy().prop_map(Op::AddEvent),
        2 => (any::<usize>(), first_name_strategy()).prop_map(|(i, n)| Op::Rename(i, n)),
        1 => (any::<usize>(), 5000u16..6000).prop_map(|(i, n)| Op::ChangeId(i, n)),
        1 => any::<usize>().prop_map(Op::RemovePerson),
    ]
}

/// Strategy for generating a mutation script.
pub fn ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..=max_len)
}

/// Applies `ops` in one transaction labelled `label`. Steps that target a
/// person when none exists, or that would collide on an id, are skipped.
pub fn apply_ops(db: &Database, label: &str, batch: bool, ops: &[Op]) -> genedb_core::CoreResult<()> {
    db.with_transaction(label, batch, |db, txn| {
        let mut live: Vec<Handle> = db.get_person_handles(false);
        for op in ops {
            match op {
                Op::AddPerson(p) => live.push(db.add_person(p.clone(), txn)?),
                Op::AddEvent(e) => {
                    db.add_event(e.clone(), txn)?;
                }
                Op::Rename(i, name) if !live.is_empty() => {
                    let mut p = db.get_in_txn::<Person>(live[i % live.len()], txn)?;
                    p.primary_name.first_name = name.clone();
                    db.commit_person(p, txn)?;
                }
                Op::ChangeId(i, n) if !live.is_empty() => {
                    let mut p = db.get_in_txn::<Person>(live[i % live.len()], txn)?;
                    p.gramps_id = format!("X{n}");
                    match db.commit_person(p, txn) {
                        Err(genedb_core::CoreError::IdCollision { .. }) => {}
                        other => other?,
                    }
                }
                Op::RemovePerson(i) if !live.is_empty() => {
                    let handle = live.remove(i % live.len());
                    db.remove_person(handle, txn)?;
                }
                _ => {}
            }
        }
        Ok(())
    })
}
