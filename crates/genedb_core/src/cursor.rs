//! Forward-only cursor over one record kind.

use crate::access::DbRead;
use crate::model::{Handle, Record};
use std::marker::PhantomData;
use tracing::warn;

/// Restartable iterator over the records of one kind.
///
/// The handle list is captured when the cursor is created; each record is
/// fetched when it is produced, so it reflects the content at that moment.
/// Handles removed in the meantime are skipped. Works over any reader,
/// including proxies.
pub struct Cursor<'a, T: Record, D: DbRead + ?Sized> {
    db: &'a D,
    handles: Vec<Handle>,
    pos: usize,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T: Record, D: DbRead + ?Sized> Cursor<'a, T, D> {
    /// Creates a cursor over `handles`.
    pub fn new(db: &'a D, handles: Vec<Handle>) -> Self {
        Self {
            db,
            handles,
            pos: 0,
            _record: PhantomData,
        }
    }

    /// Restarts and returns the first record.
    pub fn first(&mut self) -> Option<(Handle, T)> {
        self.pos = 0;
        self.next()
    }

    /// Number of handles captured at creation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no handles were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Releases the captured handles. Further calls yield nothing.
    pub fn close(&mut self) {
        self.handles = Vec::new();
        self.pos = 0;
    }
}

impl<T: Record, D: DbRead + ?Sized> Iterator for Cursor<'_, T, D> {
    type Item = (Handle, T);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&handle) = self.handles.get(self.pos) {
            self.pos += 1;
            match self.db.get_from_handle::<T>(handle) {
                Ok(record) => return Some((handle, record)),
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    warn!(kind = %T::KIND, %handle, error = %e, "cursor skipped unreadable record");
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.handles.len().saturating_sub(self.pos)))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Name, Person};
    use crate::{Database, DbRead, DbWrite};

    fn db_with_people(n: usize) -> Database {
        let db = Database::open_in_memory();
        db.with_transaction("seed", false, |db, txn| {
            for i in 0..n {
                db.add(Person::new(Name::new(format!("P{i}"), "Test")), txn)?;
            }
            Ok(())
        })
        .unwrap();
        db
    }

    #[test]
    fn iterates_every_record() {
        let db = db_with_people(3);
        let cursor = db.cursor::<Person>();
        assert_eq!(cursor.len(), 3);
        assert_eq!(cursor.count(), 3);
    }

    #[test]
    fn first_restarts() {
        let db = db_with_people(2);
        let mut cursor = db.cursor::<Person>();
        let (h1, _) = cursor.first().unwrap();
        cursor.next().unwrap();
        assert!(cursor.next().is_none());
        assert_eq!(cursor.first().map(|(h, _)| h), Some(h1));
    }

    #[test]
    fn empty_table_gives_none() {
        let db = Database::open_in_memory();
        let mut cursor = db.cursor::<Person>();
        assert!(cursor.is_empty());
        assert!(cursor.first().is_none());
    }

    #[test]
    fn removed_handles_are_skipped() {
        let db = db_with_people(3);
        let mut cursor = db.cursor::<Person>();
        let (first, _) = cursor.first().unwrap();
        let victim = db
            .handles::<Person>(false)
            .into_iter()
            .find(|h| *h != first)
            .unwrap();
        db.with_transaction("remove", false, |db, txn| db.remove::<Person>(victim, txn))
            .unwrap();
        assert_eq!(cursor.count(), 1);
    }

    #[test]
    fn close_empties_cursor() {
        let db = db_with_people(2);
        let mut cursor = db.cursor::<Person>();
        cursor.close();
        assert!(cursor.first().is_none());
        assert_eq!(cursor.len(), 0);
    }
}
