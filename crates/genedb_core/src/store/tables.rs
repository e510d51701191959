//! The full set of record tables.

use super::RecordStore;
use crate::error::CoreResult;
use crate::model::{
    AnyRecord, Event, Family, Handle, Media, Note, Person, Place, Record, Repository, Source,
};
use crate::types::EntityKind;

/// Runs `$body` with `$t` aliased to the record type of `$kind`.
macro_rules! with_kind {
    ($kind:expr, $t:ident => $body:expr) => {
        match $kind {
            $crate::types::EntityKind::Person => {
                type $t = $crate::model::Person;
                $body
            }
            $crate::types::EntityKind::Family => {
                type $t = $crate::model::Family;
                $body
            }
            $crate::types::EntityKind::Event => {
                type $t = $crate::model::Event;
                $body
            }
            $crate::types::EntityKind::Place => {
                type $t = $crate::model::Place;
                $body
            }
            $crate::types::EntityKind::Source => {
                type $t = $crate::model::Source;
                $body
            }
            $crate::types::EntityKind::Repository => {
                type $t = $crate::model::Repository;
                $body
            }
            $crate::types::EntityKind::Media => {
                type $t = $crate::model::Media;
                $body
            }
            $crate::types::EntityKind::Note => {
                type $t = $crate::model::Note;
                $body
            }
        }
    };
}

pub(crate) use with_kind;

/// One table per record kind.
#[derive(Debug, Default)]
#[allow(missing_docs)]
pub struct Tables {
    pub person: RecordStore<Person>,
    pub family: RecordStore<Family>,
    pub event: RecordStore<Event>,
    pub place: RecordStore<Place>,
    pub source: RecordStore<Source>,
    pub repository: RecordStore<Repository>,
    pub media: RecordStore<Media>,
    pub note: RecordStore<Note>,
}

impl Tables {
    /// Empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table of `T`.
    #[must_use]
    pub fn table<T: Record>(&self) -> &RecordStore<T> {
        T::table(self)
    }

    /// Number of live records of a kind.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        with_kind!(kind, T => T::table(self).len())
    }

    /// Whether a live record of `kind` has this handle.
    #[must_use]
    pub fn contains(&self, kind: EntityKind, handle: &Handle) -> bool {
        with_kind!(kind, T => T::table(self).contains(handle))
    }

    /// Public ids in use for a kind, sorted.
    #[must_use]
    pub fn ids(&self, kind: EntityKind) -> Vec<String> {
        with_kind!(kind, T => T::table(self).ids())
    }

    /// Resolves a public id of a kind.
    #[must_use]
    pub fn id_owner(&self, kind: EntityKind, id: &str) -> Option<Handle> {
        with_kind!(kind, T => T::table(self).handle_for_id(id))
    }

    /// Serialized form of a live record.
    pub fn encoded(&self, kind: EntityKind, handle: &Handle) -> CoreResult<Option<Vec<u8>>> {
        with_kind!(kind, T => match T::table(self).get(handle) {
            Some(record) => Ok(Some(genedb_codec::to_cbor(record)?)),
            None => Ok(None),
        })
    }

    /// Writes `record` (or removes, for `None`) under `handle`.
    pub(crate) fn apply(&mut self, kind: EntityKind, handle: Handle, record: Option<AnyRecord>) {
        match record {
            Some(record) => record.apply_to(self, handle),
            None => with_kind!(kind, T => T::table_mut(self).apply(handle, None)),
        }
    }

    /// Every `(kind, owner)` among `kinds` whose record references
    /// `target`. Handles are unique across kinds, so the target's kind is
    /// not needed.
    #[must_use]
    pub fn referrers(&self, target: Handle, kinds: &[EntityKind]) -> Vec<(EntityKind, Handle)> {
        let mut out = Vec::new();
        for &kind in kinds {
            with_kind!(kind, T => {
                let mut owners: Vec<Handle> = T::table(self)
                    .iter()
                    .filter(|(_, r)| r.references().iter().any(|(_, h)| *h == target))
                    .map(|(h, _)| *h)
                    .collect();
                owners.sort();
                out.extend(owners.into_iter().map(|h| (kind, h)));
            });
        }
        out
    }

    /// Every reference held by a live record of `kind`, as
    /// `(owner, (target_kind, target))`.
    #[must_use]
    pub fn references_of(&self, kind: EntityKind) -> Vec<(Handle, (EntityKind, Handle))> {
        with_kind!(kind, T => T::table(self)
            .iter()
            .flat_map(|(h, r)| r.references().into_iter().map(move |t| (*h, t)))
            .collect())
    }

    /// Distinct surnames of the people table.
    #[must_use]
    pub fn surnames(&self) -> Vec<String> {
        self.person.group_keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Name;

    #[test]
    fn dispatch_by_kind() {
        let mut tables = Tables::new();
        let h = Handle::new();
        let mut p = Person::new(Name::new("Ada", "Byron"));
        p.gramps_id = "I0001".into();
        tables.apply(EntityKind::Person, h, Some(p.into_any()));

        assert_eq!(tables.count(EntityKind::Person), 1);
        assert_eq!(tables.count(EntityKind::Family), 0);
        assert!(tables.contains(EntityKind::Person, &h));
        assert!(!tables.contains(EntityKind::Event, &h));
        assert_eq!(tables.id_owner(EntityKind::Person, "I0001"), Some(h));
        assert!(tables.encoded(EntityKind::Person, &h).unwrap().is_some());

        tables.apply(EntityKind::Person, h, None);
        assert_eq!(tables.count(EntityKind::Person), 0);
    }

    #[test]
    fn referrers_scan_requested_kinds() {
        let mut tables = Tables::new();
        let father = Handle::new();
        let fam_handle = Handle::new();
        tables.apply(
            EntityKind::Family,
            fam_handle,
            Some(Family::new(Some(father), None).into_any()),
        );
        let found = tables.referrers(father, &EntityKind::ALL);
        assert_eq!(found, vec![(EntityKind::Family, fam_handle)]);
        assert!(tables.referrers(father, &[EntityKind::Event]).is_empty());
    }
}
