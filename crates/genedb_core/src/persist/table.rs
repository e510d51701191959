//! Table and history files.

use crate::error::{CoreError, CoreResult};
use crate::model::Record;
use crate::store::RecordStore;
use crate::transaction::CommittedTransaction;
use genedb_codec::Value;
use genedb_storage::StorageBackend;

/// Loads a table. A missing file is an empty table.
pub fn load_table<T: Record>(backend: &dyn StorageBackend) -> CoreResult<RecordStore<T>> {
    let Some(bytes) = backend.load()? else {
        return Ok(RecordStore::new());
    };
    let records: Vec<T> = genedb_codec::from_cbor(&bytes)?;
    if let Some(unhandled) = records.iter().find(|r| r.handle().is_none()) {
        return Err(CoreError::invalid_format(format!(
            "{} {} stored without a handle",
            T::KIND,
            unhandled.gramps_id()
        )));
    }
    Ok(RecordStore::from_records(records))
}

/// Writes a table, records ordered by handle.
pub fn save_table<T: Record>(store: &RecordStore<T>, backend: &mut dyn StorageBackend) -> CoreResult<()> {
    let mut records: Vec<&T> = store.iter().map(|(_, r)| r).collect();
    records.sort_by_key(|r| r.handle());
    backend.store(&genedb_codec::to_cbor(&records)?)?;
    Ok(())
}

/// Loads a table as untyped values, for migrations.
pub fn load_raw(backend: &dyn StorageBackend) -> CoreResult<Vec<Value>> {
    let Some(bytes) = backend.load()? else {
        return Ok(Vec::new());
    };
    match genedb_codec::value_from_cbor(&bytes)? {
        Value::Array(items) => Ok(items),
        other => Err(CoreError::invalid_format(format!(
            "table file is not an array: {other:?}"
        ))),
    }
}

/// Writes untyped values as a table.
pub fn save_raw(records: Vec<Value>, backend: &mut dyn StorageBackend) -> CoreResult<()> {
    backend.store(&genedb_codec::value_to_cbor(&Value::Array(records))?)?;
    Ok(())
}

/// Loads the undo history, oldest first.
pub fn load_history(backend: &dyn StorageBackend) -> CoreResult<Vec<CommittedTransaction>> {
    match backend.load()? {
        Some(bytes) if !bytes.is_empty() => Ok(genedb_codec::from_cbor(&bytes)?),
        _ => Ok(Vec::new()),
    }
}

/// Writes the undo history.
pub fn save_history<'a, I>(history: I, backend: &mut dyn StorageBackend) -> CoreResult<()>
where
    I: IntoIterator<Item = &'a CommittedTransaction>,
{
    let list: Vec<&CommittedTransaction> = history.into_iter().collect();
    backend.store(&genedb_codec::to_cbor(&list)?)?;
    Ok(())
}
