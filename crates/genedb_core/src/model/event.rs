//! Event records.

use super::common::refs;
use super::record::record_fields;
use super::{AnyRecord, Attribute, Date, Handle, MediaRef, Record, SourceRef};
use crate::store::{RecordStore, Tables};
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of thing happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventType {
    /// Birth.
    Birth,
    /// Death.
    Death,
    /// Baptism or christening.
    Baptism,
    /// Burial.
    Burial,
    /// Marriage.
    Marriage,
    /// Divorce.
    Divorce,
    /// Place of residence.
    Residence,
    /// Occupation.
    Occupation,
    /// Census entry.
    Census,
    /// Anything else.
    Custom(String),
    /// Not recorded.
    #[default]
    Unknown,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Custom(name) => f.write_str(name),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Something that happened at a date and place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    /// Handle, assigned on add.
    pub handle: Option<Handle>,
    /// Public id.
    pub gramps_id: String,
    /// Last change stamp.
    pub change: i64,
    /// Privacy flag.
    pub private: bool,
    /// Type of event.
    pub event_type: EventType,
    /// When it happened.
    pub date: Option<Date>,
    /// Free description.
    pub description: String,
    /// Where it happened.
    pub place: Option<Handle>,
    /// Media.
    pub media_list: Vec<MediaRef>,
    /// Notes.
    pub note_list: Vec<Handle>,
    /// Citations.
    pub source_list: Vec<SourceRef>,
    /// Attributes.
    pub attribute_list: Vec<Attribute>,
}

impl Event {
    /// An event of the given type.
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            ..Self::default()
        }
    }

    /// Sets the date.
    #[must_use]
    pub fn with_date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets the place.
    #[must_use]
    pub fn with_place(mut self, place: Handle) -> Self {
        self.place = Some(place);
        self
    }
}

impl Record for Event {
    const KIND: EntityKind = EntityKind::Event;

    record_fields!();

    fn references(&self) -> Vec<(EntityKind, Handle)> {
        let mut out = Vec::new();
        refs::collect_opt(&mut out, EntityKind::Place, self.place);
        refs::collect(&mut out, EntityKind::Media, &self.media_list);
        refs::collect(&mut out, EntityKind::Note, &self.note_list);
        refs::collect(&mut out, EntityKind::Source, &self.source_list);
        out
    }

    fn retain_references(&mut self, keep: &mut dyn FnMut(EntityKind, Handle) -> bool) {
        refs::retain_opt(&mut self.place, EntityKind::Place, keep);
        refs::retain(&mut self.media_list, EntityKind::Media, keep);
        refs::retain(&mut self.note_list, EntityKind::Note, keep);
        refs::retain(&mut self.source_list, EntityKind::Source, keep);
    }

    fn replace_reference(&mut self, kind: EntityKind, old: Handle, new: Handle) {
        refs::replace_opt(&mut self.place, kind, EntityKind::Place, old, new);
        refs::replace(&mut self.media_list, kind, EntityKind::Media, old, new);
        refs::replace(&mut self.note_list, kind, EntityKind::Note, old, new);
        refs::replace(&mut self.source_list, kind, EntityKind::Source, old, new);
    }

    fn sanitize_private(&mut self) {
        refs::strip_private(&mut self.media_list);
        refs::strip_private(&mut self.source_list);
        self.attribute_list.retain(|a| !a.private);
    }

    fn sort_key(&self) -> String {
        let date = self.date.map_or(0, |d| d.sort_value());
        format!("{date:012}{}", self.gramps_id)
    }

    fn table(tables: &Tables) -> &RecordStore<Self> {
        &tables.event
    }

    fn table_mut(tables: &mut Tables) -> &mut RecordStore<Self> {
        &mut tables.event
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Event(self)
    }
}
