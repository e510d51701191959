//! The generic proxy.

use crate::access::{DbRead, DbWrite};
use crate::error::{CoreError, CoreResult};
use crate::model::{Handle, Record};
use crate::store::with_kind;
use crate::transaction::{Transaction, UndoOutcome};
use crate::types::EntityKind;

/// Decides what a [`Proxy`] shows.
pub trait ProxyFilter {
    /// Whether a record of the wrapped database is visible.
    fn include<T: Record>(&self, record: &T) -> bool;

    /// Adjusts a visible record before it is handed out.
    fn sanitize<T: Record>(&self, record: &mut T) {
        let _ = record;
    }
}

/// A filtered, read-only view of `D`.
#[derive(Debug, Clone)]
pub struct Proxy<D, F> {
    inner: D,
    filter: F,
}

impl<D: DbRead, F: ProxyFilter> Proxy<D, F> {
    /// Wraps `inner` behind `filter`.
    pub fn with_filter(inner: D, filter: F) -> Self {
        Self { inner, filter }
    }

    /// The wrapped database.
    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// The filter.
    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// Unwraps the proxy.
    pub fn into_inner(self) -> D {
        self.inner
    }

    /// Whether `(kind, handle)` is live in the wrapped database and passes
    /// the filter.
    fn visible(&self, kind: EntityKind, handle: Handle) -> bool {
        with_kind!(kind, T => self
            .inner
            .get_from_handle::<T>(handle)
            .is_ok_and(|r| self.filter.include(&r)))
    }

    /// A visible record as handed out: sanitized, with references to hidden
    /// records dropped.
    fn present<T: Record>(&self, mut record: T) -> T {
        self.filter.sanitize(&mut record);
        record.retain_references(&mut |kind, handle| self.visible(kind, handle));
        record
    }

    fn refers_visibly(&self, kind: EntityKind, owner: Handle, target: Handle) -> bool {
        with_kind!(kind, T => self
            .get_from_handle::<T>(owner)
            .is_ok_and(|r| r.references().iter().any(|(_, h)| *h == target)))
    }
}

impl<D: DbRead, F: ProxyFilter> DbRead for Proxy<D, F> {
    fn get_from_handle<T: Record>(&self, handle: Handle) -> CoreResult<T> {
        let record = self.inner.get_from_handle::<T>(handle)?;
        if !self.filter.include(&record) {
            return Err(CoreError::not_found(T::KIND, handle));
        }
        Ok(self.present(record))
    }

    fn get_from_id<T: Record>(&self, id: &str) -> CoreResult<T> {
        let record = self.inner.get_from_id::<T>(id)?;
        if !self.filter.include(&record) {
            return Err(CoreError::not_found(T::KIND, id));
        }
        Ok(self.present(record))
    }

    fn handles<T: Record>(&self, sorted: bool) -> Vec<Handle> {
        self.inner
            .handles::<T>(sorted)
            .into_iter()
            .filter(|h| self.visible(T::KIND, *h))
            .collect()
    }

    fn has_handle(&self, kind: EntityKind, handle: Handle) -> bool {
        self.visible(kind, handle)
    }

    fn find_backlink_handles(
        &self,
        handle: Handle,
        kinds: Option<&[EntityKind]>,
    ) -> Vec<(EntityKind, Handle)> {
        if !EntityKind::ALL.iter().any(|k| self.visible(*k, handle)) {
            return Vec::new();
        }
        self.inner
            .find_backlink_handles(handle, kinds)
            .into_iter()
            .filter(|(kind, owner)| self.refers_visibly(*kind, *owner, handle))
            .collect()
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn default_handle(&self) -> Option<Handle> {
        self.inner
            .default_handle()
            .filter(|h| self.visible(EntityKind::Person, *h))
    }

    fn bookmarks(&self, kind: EntityKind) -> Vec<Handle> {
        self.inner
            .bookmarks(kind)
            .into_iter()
            .filter(|h| self.visible(kind, *h))
            .collect()
    }
}

impl<D: DbRead, F: ProxyFilter> DbWrite for Proxy<D, F> {
    fn transaction_begin(&self, _batch: bool) -> CoreResult<Transaction> {
        Err(CoreError::read_only("transaction_begin"))
    }

    fn transaction_commit(&self, _txn: Transaction, _label: &str) -> CoreResult<()> {
        Err(CoreError::read_only("transaction_commit"))
    }

    fn transaction_abort(&self, _txn: Transaction) -> CoreResult<()> {
        Err(CoreError::read_only("transaction_abort"))
    }

    fn add<T: Record>(&self, _record: T, _txn: &mut Transaction) -> CoreResult<Handle> {
        Err(CoreError::read_only("add"))
    }

    fn commit<T: Record>(
        &self,
        _record: T,
        _txn: &mut Transaction,
        _change_time: Option<i64>,
    ) -> CoreResult<()> {
        Err(CoreError::read_only("commit"))
    }

    fn remove<T: Record>(&self, _handle: Handle, _txn: &mut Transaction) -> CoreResult<()> {
        Err(CoreError::read_only("remove"))
    }

    fn undo(&self) -> CoreResult<UndoOutcome> {
        Err(CoreError::read_only("undo"))
    }

    fn redo(&self) -> CoreResult<UndoOutcome> {
        Err(CoreError::read_only("redo"))
    }

    fn set_default_person_handle(&self, _handle: Option<Handle>) -> CoreResult<()> {
        Err(CoreError::read_only("set_default_person_handle"))
    }

    fn set_bookmarks(&self, _kind: EntityKind, _handles: Vec<Handle>) -> CoreResult<()> {
        Err(CoreError::read_only("set_bookmarks"))
    }
}
