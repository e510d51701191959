//! Read and write contracts shared by databases and proxies.

use crate::cursor::Cursor;
use crate::error::CoreResult;
use crate::model::{Event, Family, Handle, Media, Note, Person, Place, Record, Repository, Source};
use crate::transaction::{Transaction, UndoOutcome};
use crate::types::EntityKind;

/// Generates the per-kind read wrappers.
macro_rules! kind_readers {
    ($($t:ty => $get:ident, $get_id:ident, $handles:ident, $cursor:ident;)*) => {
        $(
            #[doc = concat!("[`DbRead::get_from_handle`] for [`", stringify!($t), "`].")]
            fn $get(&self, handle: Handle) -> CoreResult<$t> {
                self.get_from_handle::<$t>(handle)
            }

            #[doc = concat!("[`DbRead::get_from_id`] for [`", stringify!($t), "`].")]
            fn $get_id(&self, id: &str) -> CoreResult<$t> {
                self.get_from_id::<$t>(id)
            }

            #[doc = concat!("[`DbRead::handles`] for [`", stringify!($t), "`].")]
            fn $handles(&self, sorted: bool) -> Vec<Handle> {
                self.handles::<$t>(sorted)
            }

            #[doc = concat!("[`DbRead::cursor`] for [`", stringify!($t), "`].")]
            fn $cursor(&self) -> Cursor<'_, $t, Self> {
                self.cursor::<$t>()
            }
        )*
    };
}

/// Generates the per-kind write wrappers.
macro_rules! kind_writers {
    ($($t:ty => $add:ident, $commit:ident, $remove:ident;)*) => {
        $(
            #[doc = concat!("[`DbWrite::add`] for [`", stringify!($t), "`].")]
            fn $add(&self, record: $t, txn: &mut Transaction) -> CoreResult<Handle> {
                self.add(record, txn)
            }

            #[doc = concat!("[`DbWrite::commit`] for [`", stringify!($t), "`], stamped now.")]
            fn $commit(&self, record: $t, txn: &mut Transaction) -> CoreResult<()> {
                self.commit(record, txn, None)
            }

            #[doc = concat!("[`DbWrite::remove`] for [`", stringify!($t), "`].")]
            fn $remove(&self, handle: Handle, txn: &mut Transaction) -> CoreResult<()> {
                self.remove::<$t>(handle, txn)
            }
        )*
    };
}

/// Read access to a record store.
///
/// Implemented by [`Database`](crate::Database) and by every proxy, so
/// proxies can wrap each other.
pub trait DbRead {
    /// The live record with this handle.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`](crate::CoreError::NotFound) if there is none
    /// (or it is hidden by a proxy).
    fn get_from_handle<T: Record>(&self, handle: Handle) -> CoreResult<T>;

    /// The live record with this public id.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`](crate::CoreError::NotFound) if there is none.
    fn get_from_id<T: Record>(&self, id: &str) -> CoreResult<T>;

    /// Handles of every visible record of `T`, optionally in sort order.
    fn handles<T: Record>(&self, sorted: bool) -> Vec<Handle>;

    /// Whether a visible record of `kind` has this handle.
    fn has_handle(&self, kind: EntityKind, handle: Handle) -> bool;

    /// Records among `kinds` (all kinds for `None`) that reference `handle`.
    fn find_backlink_handles(
        &self,
        handle: Handle,
        kinds: Option<&[EntityKind]>,
    ) -> Vec<(EntityKind, Handle)>;

    /// Whether writes are refused.
    fn is_read_only(&self) -> bool;

    /// Handle of the home person, if one is set and visible.
    fn default_handle(&self) -> Option<Handle>;

    /// Visible bookmarked handles of `kind`, in bookmark order.
    fn bookmarks(&self, kind: EntityKind) -> Vec<Handle>;

    /// The home person.
    fn default_person(&self) -> Option<Person> {
        self.default_handle()
            .and_then(|h| self.get_person_from_handle(h).ok())
    }

    /// Cursor over every visible record of `T`.
    fn cursor<T: Record>(&self) -> Cursor<'_, T, Self> {
        Cursor::new(self, self.handles::<T>(false))
    }

    /// Number of visible records of `T`.
    fn number_of<T: Record>(&self) -> usize {
        self.handles::<T>(false).len()
    }

    /// Whether a visible record of `T` has this public id.
    fn has_id<T: Record>(&self, id: &str) -> bool {
        self.get_from_id::<T>(id).is_ok()
    }

    kind_readers! {
        Person => get_person_from_handle, get_person_from_id, get_person_handles, person_cursor;
        Family => get_family_from_handle, get_family_from_id, get_family_handles, family_cursor;
        Event => get_event_from_handle, get_event_from_id, get_event_handles, event_cursor;
        Place => get_place_from_handle, get_place_from_id, get_place_handles, place_cursor;
        Source => get_source_from_handle, get_source_from_id, get_source_handles, source_cursor;
        Repository => get_repository_from_handle, get_repository_from_id, get_repository_handles, repository_cursor;
        Media => get_media_from_handle, get_media_from_id, get_media_handles, media_cursor;
        Note => get_note_from_handle, get_note_from_id, get_note_handles, note_cursor;
    }
}

impl<D: DbRead + ?Sized> DbRead for &D {
    fn get_from_handle<T: Record>(&self, handle: Handle) -> CoreResult<T> {
        (**self).get_from_handle(handle)
    }

    fn get_from_id<T: Record>(&self, id: &str) -> CoreResult<T> {
        (**self).get_from_id(id)
    }

    fn handles<T: Record>(&self, sorted: bool) -> Vec<Handle> {
        (**self).handles::<T>(sorted)
    }

    fn has_handle(&self, kind: EntityKind, handle: Handle) -> bool {
        (**self).has_handle(kind, handle)
    }

    fn find_backlink_handles(
        &self,
        handle: Handle,
        kinds: Option<&[EntityKind]>,
    ) -> Vec<(EntityKind, Handle)> {
        (**self).find_backlink_handles(handle, kinds)
    }

    fn is_read_only(&self) -> bool {
        (**self).is_read_only()
    }

    fn default_handle(&self) -> Option<Handle> {
        (**self).default_handle()
    }

    fn bookmarks(&self, kind: EntityKind) -> Vec<Handle> {
        (**self).bookmarks(kind)
    }
}

/// Write access: transactions, mutations and history.
pub trait DbWrite: DbRead {
    /// Opens a transaction. A batch transaction silences signals while open
    /// and reports one rebuild per affected kind when committed.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidTransition`](crate::CoreError::InvalidTransition)
    /// while another transaction is open;
    /// [`CoreError::ReadOnly`](crate::CoreError::ReadOnly) on a read-only
    /// store.
    fn transaction_begin(&self, batch: bool) -> CoreResult<Transaction>;

    /// Applies every buffered mutation and records the transaction for undo.
    fn transaction_commit(&self, txn: Transaction, label: &str) -> CoreResult<()>;

    /// Discards every buffered mutation.
    fn transaction_abort(&self, txn: Transaction) -> CoreResult<()>;

    /// Buffers the creation of a record and returns its handle.
    fn add<T: Record>(&self, record: T, txn: &mut Transaction) -> CoreResult<Handle>;

    /// Buffers an update, or a create when no live record has the handle.
    /// `change_time` defaults to now.
    fn commit<T: Record>(
        &self,
        record: T,
        txn: &mut Transaction,
        change_time: Option<i64>,
    ) -> CoreResult<()>;

    /// Buffers the removal of a record.
    fn remove<T: Record>(&self, handle: Handle, txn: &mut Transaction) -> CoreResult<()>;

    /// Reverts the most recent transaction.
    fn undo(&self) -> CoreResult<UndoOutcome>;

    /// Reapplies the most recently undone transaction.
    fn redo(&self) -> CoreResult<UndoOutcome>;

    /// Sets or clears the home person. Not part of any transaction and not
    /// undoable.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`](crate::CoreError::NotFound) if `handle` is
    /// not a live person.
    fn set_default_person_handle(&self, handle: Option<Handle>) -> CoreResult<()>;

    /// Replaces the bookmarks of `kind`. Duplicates keep their first
    /// position.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`](crate::CoreError::NotFound) if a handle is
    /// not a live record of `kind`.
    fn set_bookmarks(&self, kind: EntityKind, handles: Vec<Handle>) -> CoreResult<()>;

    /// Runs `f` in a new transaction, committing with `label` on `Ok` and
    /// aborting on `Err`.
    fn with_transaction<R, F>(&self, label: &str, batch: bool, f: F) -> CoreResult<R>
    where
        Self: Sized,
        F: FnOnce(&Self, &mut Transaction) -> CoreResult<R>,
    {
        let mut txn = self.transaction_begin(batch)?;
        match f(self, &mut txn) {
            Ok(value) => {
                self.transaction_commit(txn, label)?;
                Ok(value)
            }
            Err(e) => {
                self.transaction_abort(txn)?;
                Err(e)
            }
        }
    }

    kind_writers! {
        Person => add_person, commit_person, remove_person;
        Family => add_family, commit_family, remove_family;
        Event => add_event, commit_event, remove_event;
        Place => add_place, commit_place, remove_place;
        Source => add_source, commit_source, remove_source;
        Repository => add_repository, commit_repository, remove_repository;
        Media => add_media, commit_media, remove_media;
        Note => add_note, commit_note, remove_note;
    }
}
