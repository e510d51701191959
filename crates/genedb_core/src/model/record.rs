//! The `Record` trait and the kind-erased [`AnyRecord`].

use super::{Event, Family, Handle, Media, Note, Person, Place, Repository, Source};
use crate::error::CoreResult;
use crate::store::{RecordStore, Tables};
use crate::types::EntityKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Common contract of every stored record kind.
///
/// Cross references are always `(kind, handle)` pairs; a record never owns
/// or borrows another record.
pub trait Record:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Kind of this record type.
    const KIND: EntityKind;

    /// Handle, `None` until the record has been added.
    fn handle(&self) -> Option<Handle>;

    /// Sets the handle.
    fn set_handle(&mut self, handle: Handle);

    /// User-facing id, e.g. `I0001`.
    fn gramps_id(&self) -> &str;

    /// Sets the user-facing id.
    fn set_gramps_id(&mut self, id: String);

    /// Last change, seconds since the Unix epoch.
    fn change(&self) -> i64;

    /// Sets the change stamp.
    fn set_change(&mut self, change: i64);

    /// Whether the whole record is private.
    fn is_private(&self) -> bool;

    /// Every handle this record points at.
    fn references(&self) -> Vec<(EntityKind, Handle)>;

    /// Drops every reference for which `keep` returns false. Optional
    /// single references (e.g. a family's father) are set to `None`.
    fn retain_references(&mut self, keep: &mut dyn FnMut(EntityKind, Handle) -> bool);

    /// Drops references to the given handles of one kind.
    fn remove_references(&mut self, kind: EntityKind, handles: &[Handle]) {
        self.retain_references(&mut |k, h| !(k == kind && handles.contains(&h)));
    }

    /// Rewrites references to `old` so they point at `new`.
    fn replace_reference(&mut self, kind: EntityKind, old: Handle, new: Handle);

    /// Strips private sub-objects (attributes, references, names, ...).
    fn sanitize_private(&mut self);

    /// Key used by sorted handle listings.
    fn sort_key(&self) -> String {
        self.gramps_id().to_string()
    }

    /// Keys of the non-unique grouping index.
    fn group_keys(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the record points at `(kind, handle)`.
    fn refers_to(&self, kind: EntityKind, handle: Handle) -> bool {
        self.references().contains(&(kind, handle))
    }

    #[doc(hidden)]
    fn table(tables: &Tables) -> &RecordStore<Self>;

    #[doc(hidden)]
    fn table_mut(tables: &mut Tables) -> &mut RecordStore<Self>;

    /// Wraps the record in [`AnyRecord`].
    fn into_any(self) -> AnyRecord;
}

/// Implements the bookkeeping accessors of [`Record`] for a struct with
/// `handle`, `gramps_id`, `change` and `private` fields.
macro_rules! record_fields {
    () => {
        fn handle(&self) -> Option<$crate::model::Handle> {
            self.handle
        }

        fn set_handle(&mut self, handle: $crate::model::Handle) {
            self.handle = Some(handle);
        }

        fn gramps_id(&self) -> &str {
            &self.gramps_id
        }

        fn set_gramps_id(&mut self, id: String) {
            self.gramps_id = id;
        }

        fn change(&self) -> i64 {
            self.change
        }

        fn set_change(&mut self, change: i64) {
            self.change = change;
        }

        fn is_private(&self) -> bool {
            self.private
        }
    };
}

pub(crate) use record_fields;

/// A record of any kind.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum AnyRecord {
    Person(Person),
    Family(Family),
    Event(Event),
    Place(Place),
    Source(Source),
    Repository(Repository),
    Media(Media),
    Note(Note),
}

/// Runs `$body` with `$r` bound to the inner record of `$any`.
macro_rules! with_record {
    ($any:expr, $r:ident => $body:expr) => {
        match $any {
            AnyRecord::Person($r) => $body,
            AnyRecord::Family($r) => $body,
            AnyRecord::Event($r) => $body,
            AnyRecord::Place($r) => $body,
            AnyRecord::Source($r) => $body,
            AnyRecord::Repository($r) => $body,
            AnyRecord::Media($r) => $body,
            AnyRecord::Note($r) => $body,
        }
    };
}

impl AnyRecord {
    /// Decodes stored bytes of the given kind.
    pub fn decode(kind: EntityKind, bytes: &[u8]) -> CoreResult<Self> {
        use genedb_codec::from_cbor;
        Ok(match kind {
            EntityKind::Person => Self::Person(from_cbor(bytes)?),
            EntityKind::Family => Self::Family(from_cbor(bytes)?),
            EntityKind::Event => Self::Event(from_cbor(bytes)?),
            EntityKind::Place => Self::Place(from_cbor(bytes)?),
            EntityKind::Source => Self::Source(from_cbor(bytes)?),
            EntityKind::Repository => Self::Repository(from_cbor(bytes)?),
            EntityKind::Media => Self::Media(from_cbor(bytes)?),
            EntityKind::Note => Self::Note(from_cbor(bytes)?),
        })
    }

    /// Encodes the inner record.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        with_record!(self, r => Ok(genedb_codec::to_cbor(r)?))
    }

    /// Kind of the inner record.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        with_record!(self, r => record_kind(r))
    }

    /// Handle of the inner record.
    #[must_use]
    pub fn handle(&self) -> Option<Handle> {
        with_record!(self, r => r.handle())
    }

    /// Public id of the inner record.
    #[must_use]
    pub fn gramps_id(&self) -> &str {
        with_record!(self, r => r.gramps_id())
    }

    /// References of the inner record.
    #[must_use]
    pub fn references(&self) -> Vec<(EntityKind, Handle)> {
        with_record!(self, r => r.references())
    }

    /// Writes the record into its table under `handle`, replacing any
    /// previous version.
    pub(crate) fn apply_to(self, tables: &mut Tables, handle: Handle) {
        with_record!(self, r => apply_one(tables, handle, Some(r)))
    }
}

fn record_kind<T: Record>(_: &T) -> EntityKind {
    T::KIND
}

fn apply_one<T: Record>(tables: &mut Tables, handle: Handle, record: Option<T>) {
    T::table_mut(tables).apply(handle, record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Name;

    #[test]
    fn any_record_roundtrip() {
        let mut person = Person::new(Name::new("Ada", "Byron"));
        person.set_handle(Handle::new());
        person.set_gramps_id("I0001".into());
        let any = person.clone().into_any();
        assert_eq!(any.kind(), EntityKind::Person);
        assert_eq!(any.gramps_id(), "I0001");

        let bytes = any.encode().unwrap();
        let back = AnyRecord::decode(EntityKind::Person, &bytes).unwrap();
        assert_eq!(back, AnyRecord::Person(person));
    }
}
