//! Place records.

use super::common::refs;
use super::record::record_fields;
use super::{AnyRecord, Handle, MediaRef, Record, SourceRef};
use crate::store::{RecordStore, Tables};
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};

/// A location. Places nest through `enclosed_by`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Place {
    /// Handle, assigned on add.
    pub handle: Option<Handle>,
    /// Public id.
    pub gramps_id: String,
    /// Last change stamp.
    pub change: i64,
    /// Privacy flag.
    pub private: bool,
    /// Display title.
    pub title: String,
    /// Latitude as entered.
    pub lat: String,
    /// Longitude as entered.
    pub long: String,
    /// Places this one lies within.
    pub enclosed_by: Vec<Handle>,
    /// Media.
    pub media_list: Vec<MediaRef>,
    /// Notes.
    pub note_list: Vec<Handle>,
    /// Citations.
    pub source_list: Vec<SourceRef>,
}

impl Place {
    /// A place with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl Record for Place {
    const KIND: EntityKind = EntityKind::Place;

    record_fields!();

    fn references(&self) -> Vec<(EntityKind, Handle)> {
        let mut out = Vec::new();
        refs::collect(&mut out, EntityKind::Place, &self.enclosed_by);
        refs::collect(&mut out, EntityKind::Media, &self.media_list);
        refs::collect(&mut out, EntityKind::Note, &self.note_list);
        refs::collect(&mut out, EntityKind::Source, &self.source_list);
        out
    }

    fn retain_references(&mut self, keep: &mut dyn FnMut(EntityKind, Handle) -> bool) {
        refs::retain(&mut self.enclosed_by, EntityKind::Place, keep);
        refs::retain(&mut self.media_list, EntityKind::Media, keep);
        refs::retain(&mut self.note_list, EntityKind::Note, keep);
        refs::retain(&mut self.source_list, EntityKind::Source, keep);
    }

    fn replace_reference(&mut self, kind: EntityKind, old: Handle, new: Handle) {
        refs::replace(&mut self.enclosed_by, kind, EntityKind::Place, old, new);
        refs::replace(&mut self.media_list, kind, EntityKind::Media, old, new);
        refs::replace(&mut self.note_list, kind, EntityKind::Note, old, new);
        refs::replace(&mut self.source_list, kind, EntityKind::Source, old, new);
    }

    fn sanitize_private(&mut self) {
        refs::strip_private(&mut self.media_list);
        refs::strip_private(&mut self.source_list);
    }

    fn sort_key(&self) -> String {
        self.title.to_lowercase()
    }

    fn table(tables: &Tables) -> &RecordStore<Self> {
        &tables.place
    }

    fn table_mut(tables: &mut Tables) -> &mut RecordStore<Self> {
        &mut tables.place
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Place(self)
    }
}
