//! Media and note records.

use super::common::refs;
use super::record::record_fields;
use super::{AnyRecord, Attribute, Date, Handle, Record, SourceRef};
use crate::store::{RecordStore, Tables};
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};

/// An image or other media file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
    /// Handle, assigned on add.
    pub handle: Option<Handle>,
    /// Public id.
    pub gramps_id: String,
    /// Last change stamp.
    pub change: i64,
    /// Privacy flag.
    pub private: bool,
    /// File path.
    pub path: String,
    /// MIME type.
    pub mime: String,
    /// Description.
    pub desc: String,
    /// Date the media was made.
    pub date: Option<Date>,
    /// Notes.
    pub note_list: Vec<Handle>,
    /// Citations.
    pub source_list: Vec<SourceRef>,
    /// Attributes.
    pub attribute_list: Vec<Attribute>,
}

impl Media {
    /// A media object at `path`.
    pub fn new(path: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime: mime.into(),
            ..Self::default()
        }
    }
}

impl Record for Media {
    const KIND: EntityKind = EntityKind::Media;

    record_fields!();

    fn references(&self) -> Vec<(EntityKind, Handle)> {
        let mut out = Vec::new();
        refs::collect(&mut out, EntityKind::Note, &self.note_list);
        refs::collect(&mut out, EntityKind::Source, &self.source_list);
        out
    }

    fn retain_references(&mut self, keep: &mut dyn FnMut(EntityKind, Handle) -> bool) {
        refs::retain(&mut self.note_list, EntityKind::Note, keep);
        refs::retain(&mut self.source_list, EntityKind::Source, keep);
    }

    fn replace_reference(&mut self, kind: EntityKind, old: Handle, new: Handle) {
        refs::replace(&mut self.note_list, kind, EntityKind::Note, old, new);
        refs::replace(&mut self.source_list, kind, EntityKind::Source, old, new);
    }

    fn sanitize_private(&mut self) {
        refs::strip_private(&mut self.source_list);
        self.attribute_list.retain(|a| !a.private);
    }

    fn sort_key(&self) -> String {
        self.desc.to_lowercase()
    }

    fn table(tables: &Tables) -> &RecordStore<Self> {
        &tables.media
    }

    fn table_mut(tables: &mut Tables) -> &mut RecordStore<Self> {
        &mut tables.media
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Media(self)
    }
}

/// Kind of note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoteType {
    /// General note.
    #[default]
    General,
    /// Research notes.
    Research,
    /// Transcript of a document.
    Transcript,
    /// Anything else.
    Custom(String),
}

/// Free text attached to other records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    /// Handle, assigned on add.
    pub handle: Option<Handle>,
    /// Public id.
    pub gramps_id: String,
    /// Last change stamp.
    pub change: i64,
    /// Privacy flag.
    pub private: bool,
    /// The text.
    pub text: String,
    /// Type.
    pub note_type: NoteType,
}

impl Note {
    /// A general note.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

impl Record for Note {
    const KIND: EntityKind = EntityKind::Note;

    record_fields!();

    fn references(&self) -> Vec<(EntityKind, Handle)> {
        Vec::new()
    }

    fn retain_references(&mut self, _keep: &mut dyn FnMut(EntityKind, Handle) -> bool) {}

    fn replace_reference(&mut self, _kind: EntityKind, _old: Handle, _new: Handle) {}

    fn sanitize_private(&mut self) {}

    fn table(tables: &Tables) -> &RecordStore<Self> {
        &tables.note
    }

    fn table_mut(tables: &mut Tables) -> &mut RecordStore<Self> {
        &mut tables.note
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Note(self)
    }
}
