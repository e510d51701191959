//! Genealogical record types.
//!
//! Eight record kinds share the [`Record`] contract. Records point at each
//! other through [`Handle`]s only, so any record can be loaded, copied or
//! filtered on its own.

mod common;
mod event;
mod family;
mod handle;
mod media;
mod person;
mod place;
mod record;
mod source;

pub use common::{
    Attribute, ChildRef, ChildRelation, Date, DateModifier, EventRef, EventRole, Gender, MediaRef,
    Name, PersonRef, RepoRef, SourceRef, Surname, Url,
};
pub use event::{Event, EventType};
pub use family::{Family, FamilyRelType};
pub use handle::Handle;
pub use media::{Media, Note, NoteType};
pub use person::Person;
pub use place::Place;
pub use record::{AnyRecord, Record};
pub use source::{Repository, RepositoryType, Source};
