//! Family records.

use super::common::refs;
use super::record::record_fields;
use super::{AnyRecord, Attribute, ChildRef, EventRef, Handle, MediaRef, Record, SourceRef};
use crate::store::{RecordStore, Tables};
use crate::types::EntityKind;
use serde::{Deserialize, Serialize};

/// Relationship between the parents of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyRelType {
    /// Married couple.
    Married,
    /// Unmarried couple.
    Unmarried,
    /// Civil union.
    CivilUnion,
    /// Not recorded.
    #[default]
    Unknown,
}

/// A couple and their children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Family {
    /// Handle, assigned on add.
    pub handle: Option<Handle>,
    /// Public id.
    pub gramps_id: String,
    /// Last change stamp.
    pub change: i64,
    /// Privacy flag.
    pub private: bool,
    /// Father, if known.
    pub father_handle: Option<Handle>,
    /// Mother, if known.
    pub mother_handle: Option<Handle>,
    /// Children in birth order.
    pub child_ref_list: Vec<ChildRef>,
    /// Relationship of the parents.
    pub rel_type: FamilyRelType,
    /// Family events (marriage, divorce, ...).
    pub event_ref_list: Vec<EventRef>,
    /// Media.
    pub media_list: Vec<MediaRef>,
    /// Notes.
    pub note_list: Vec<Handle>,
    /// Citations.
    pub source_list: Vec<SourceRef>,
    /// Attributes.
    pub attribute_list: Vec<Attribute>,
}

impl Family {
    /// A family with the given parents.
    #[must_use]
    pub fn new(father: Option<Handle>, mother: Option<Handle>) -> Self {
        Self {
            father_handle: father,
            mother_handle: mother,
            ..Self::default()
        }
    }

    /// Appends a birth child.
    pub fn add_child(&mut self, child: Handle) {
        self.child_ref_list.push(ChildRef::new(child));
    }

    /// Handles of the children.
    pub fn children(&self) -> impl Iterator<Item = Handle> + '_ {
        self.child_ref_list.iter().map(|c| c.handle)
    }
}

impl Record for Family {
    const KIND: EntityKind = EntityKind::Family;

    record_fields!();

    fn references(&self) -> Vec<(EntityKind, Handle)> {
        let mut out = Vec::new();
        refs::collect_opt(&mut out, EntityKind::Person, self.father_handle);
        refs::collect_opt(&mut out, EntityKind::Person, self.mother_handle);
        refs::collect(&mut out, EntityKind::Person, &self.child_ref_list);
        refs::collect(&mut out, EntityKind::Event, &self.event_ref_list);
        refs::collect(&mut out, EntityKind::Media, &self.media_list);
        refs::collect(&mut out, EntityKind::Note, &self.note_list);
        refs::collect(&mut out, EntityKind::Source, &self.source_list);
        out
    }

    fn retain_references(&mut self, keep: &mut dyn FnMut(EntityKind, Handle) -> bool) {
        refs::retain_opt(&mut self.father_handle, EntityKind::Person, keep);
        refs::retain_opt(&mut self.mother_handle, EntityKind::Person, keep);
        refs::retain(&mut self.child_ref_list, EntityKind::Person, keep);
        refs::retain(&mut self.event_ref_list, EntityKind::Event, keep);
        refs::retain(&mut self.media_list, EntityKind::Media, keep);
        refs::retain(&mut self.note_list, EntityKind::Note, keep);
        refs::retain(&mut self.source_list, EntityKind::Source, keep);
    }

    fn replace_reference(&mut self, kind: EntityKind, old: Handle, new: Handle) {
        refs::replace_opt(&mut self.father_handle, kind, EntityKind::Person, old, new);
        refs::replace_opt(&mut self.mother_handle, kind, EntityKind::Person, old, new);
        refs::replace(&mut self.child_ref_list, kind, EntityKind::Person, old, new);
        refs::replace(&mut self.event_ref_list, kind, EntityKind::Event, old, new);
        refs::replace(&mut self.media_list, kind, EntityKind::Media, old, new);
        refs::replace(&mut self.note_list, kind, EntityKind::Note, old, new);
        refs::replace(&mut self.source_list, kind, EntityKind::Source, old, new);
    }

    fn sanitize_private(&mut self) {
        refs::strip_private(&mut self.child_ref_list);
        refs::strip_private(&mut self.event_ref_list);
        refs::strip_private(&mut self.media_list);
        refs::strip_private(&mut self.source_list);
        self.attribute_list.retain(|a| !a.private);
    }

    fn table(tables: &Tables) -> &RecordStore<Self> {
        &tables.family
    }

    fn table_mut(tables: &mut Tables) -> &mut RecordStore<Self> {
        &mut tables.family
    }

    fn into_any(self) -> AnyRecord {
        AnyRecord::Family(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_father_is_nulled() {
        let (father, mother, child) = (Handle::new(), Handle::new(), Handle::new());
        let mut fam = Family::new(Some(father), Some(mother));
        fam.add_child(child);
        fam.retain_references(&mut |_, h| h != father);
        assert_eq!(fam.father_handle, None);
        assert_eq!(fam.mother_handle, Some(mother));
        assert_eq!(fam.children().collect::<Vec<_>>(), vec![child]);
    }

    #[test]
    fn replace_parent() {
        let (old, new) = (Handle::new(), Handle::new());
        let mut fam = Family::new(Some(old), None);
        fam.replace_reference(EntityKind::Person, old, new);
        assert_eq!(fam.father_handle, Some(new));
    }

    #[test]
    fn private_child_refs_are_stripped() {
        let mut fam = Family::new(None, None);
        fam.add_child(Handle::new());
        fam.add_child(Handle::new());
        fam.child_ref_list[0].private = true;
        fam.sanitize_private();
        assert_eq!(fam.child_ref_list.len(), 1);
    }
}
