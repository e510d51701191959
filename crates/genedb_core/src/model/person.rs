//! Person records.

use super::common::refs;
use super::record::record_fields;
use super::{AnyRecord, Attribute, EventRef, Gender, Handle, MediaRef, Name, PersonRef, Record, SourceRef};
use crate::store::{RecordStore, Tables};
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};

/// An individual.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    /// Handle, assigned on add.
    pub handle: Option<Handle>,
    /// Public id.
    pub gramps_id: String,
    /// Last change stamp.
    pub change: i64,
    /// Privacy flag.
    pub private: bool,
    /// Gender.
    pub gender: Gender,
    /// Preferred name.
    pub primary_name: Name,
    /// Other names (married name, aliases, ...).
    pub alternate_names: Vec<Name>,
    /// Events the person took part in.
    pub event_ref_list: Vec<EventRef>,
    /// Index into `event_ref_list` of the birth event.
    pub birth_ref_index: Option<usize>,
    /// Index into `event_ref_list` of the death event.
    pub death_ref_index: Option<usize>,
    /// Families in which the person is a parent.
    pub family_list: Vec<Handle>,
    /// Families in which the person is a child.
    pub parent_family_list: Vec<Handle>,
    /// Associations with other people.
    pub person_ref_list: Vec<PersonRef>,
    /// Media.
    pub media_list: Vec<MediaRef>,
    /// Notes.
    pub note_list: Vec<Handle>,
    /// Citations.
    pub source_list: Vec<SourceRef>,
    /// Attributes.
    pub attribute_list: Vec<Attribute>,
}

impl Person {
    /// A person with the given name and no other data.
    #[must_use]
    pub fn new(name: Name) -> Self {
        Self {
            primary_name: name,
            ..Self::default()
        }
    }

    /// Sets the gender.
    #[must_use]
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    /// Reference to the birth event, if known.
    #[must_use]
    pub fn birth_ref(&self) -> Option<&EventRef> {
        self.birth_ref_index.and_then(|i| self.event_ref_list.get(i))
    }

    /// Reference to the death event, if known.
    #[must_use]
    pub fn death_ref(&self) -> Option<&EventRef> {
        self.death_ref_index.and_then(|i| self.event_ref_list.get(i))
    }

    /// Appends an event reference and returns its index.
    pub fn add_event_ref(&mut self, event_ref: EventRef) -> usize {
        self.event_ref_list.push(event_ref);
        self.event_ref_list.len() - 1
    }

    /// Keeps the event refs accepted by `keep`, moving the birth and death
    /// indices along with the surviving entries.
    fn retain_event_refs(&mut self, mut keep: impl FnMut(&EventRef) -> bool) {
        let mut moved = Vec::with_capacity(self.event_ref_list.len());
        let mut kept = Vec::with_capacity(self.event_ref_list.len());
        for event_ref in std::mem::take(&mut self.event_ref_list) {
            if keep(&event_ref) {
                moved.push(Some(kept.len()));
                kept.push(event_ref);
            } else {
                moved.push(None);
            }
        }
        self.event_ref_list = kept;
        self.birth_ref_index = self.birth_ref_index.and_then(|i| moved.get(i).copied().flatten());
        self.death_ref_index = self.death_ref_index.and_then(|i| moved.get(i).copied().flatten());
    }
}

impl Record for Person {
    const KIND: EntityKind = EntityKind::Person;

    record_fields!();

    fn references(&self) -> Vec<(EntityKind, Handle)> {
        let mut out = Vec::new();
        refs::collect(&mut out, EntityKind::Event, &self.event_ref_list);
        refs::collect(&mut out, EntityKind::Family, &self.family_list);
        refs::collect(&mut out, EntityKind::Family, &self.parent_family_list);
        refs::collect(&mut out, EntityKind::Person, &self.person_ref_list);
        refs::collect(&mut out, EntityKind::Media, &self.media_list);
        refs::collect(&mut out, EntityKind::Note, &self.note_list);
        refs::collect(&mut out, EntityKind::Source, &self.source_list);
        out
    }

    fn retain_references(&mut self, keep: &mut dyn FnMut(EntityKind, Handle) -> bool) {
        self.retain_event_refs(|r| keep(EntityKind::Event, r.handle));
        refs::retain(&mut self.family_list, EntityKind::Family, keep);
        refs::retain(&mut self.parent_family_list, EntityKind::Family, keep);
        refs::retain(&mut self.person_ref_list, EntityKind::Person, keep);
        refs::retain(&mut self.media_list, EntityKind::Media, keep);
        refs::retain(&mut self.note_list, EntityKind::Note, keep);
        refs::retain(&mut self.source_list, EntityKind::Source, keep);
    }

    fn replace_reference(&mut self, kind: EntityKind, old: Handle, new: Handle) {
        refs::replace(&mut self.event_ref_list, kind, EntityKind::Event, old, new);
        refs::replace(&mut self.family_list, kind, EntityKind::Family, old, new);
        refs::replace(&mut self.parent_family_list, kind, EntityKind::Family, old, new);
        refs::replace(&mut self.person_ref_list, kind, EntityKind::Person, old, new);
        refs::replace(&mut self.media_list, kind, EntityKind::Media, old, new);
        refs::replace(&mut self.note_list, kind, EntityKind::Note, old, new);
        refs::replace(&mut self.source_list, kind, EntityKind::Source, old, new);
    }

    fn sanitize_private(&mut self) {
        self.retain_event_refs(|r| !r.private);
        self.alternate_names.retain(|n| !n.private);
        refs::strip_private(&mut self.person_ref_list);
        refs::strip_private(&mut self.media_list);
        refs::strip_private(&mut self.source_list);
        self.attribute_list.retain(|a| !a.private);
        // A private primary name keeps the surname so the person still sorts.
        if self.primary_name.private {
            self.primary_name.first_name.clear();
            self.primary_name.title.clear();
            self.primary_name.suffix.clear();
            self.primary_name.private = false;
        }
    }

    fn sort_key(&self) -> String {
        format!(
            "{}, {}",
            self.primary_name.surname().to_lowercase(),
            self.primary_name.first_name.to_lowercase()
        )
    }

    fn group_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = std::iter::once(&self.primary_name)
            .chain(&self.alternate_names)
            .flat_map(|n| n.surname_list.iter())
            .filter(|s| !s.surname.is_empty())
            .map(|s| s.surname.clone())
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    fn table(tables: &Tables) -> &RecordStore<Self> {
        &tables.person
    }

    fn table_mut(tables: &mut Tables) -> &mut RecordStore<Self> {
        &mut tables.person
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Person(self)
    }
}
