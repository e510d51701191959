//! Database facade.

use crate::access::{DbRead, DbWrite};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::model::{AnyRecord, Handle, Record};
use crate::persist::{self, DatabaseDir, Metadata, MigrationManager, SCHEMA_VERSION};
use crate::signal::{DbSignal, DbSignalKind, ListenerId, SignalBus, SuppressionGuard};
use crate::store::{with_kind, Tables};
use crate::transaction::{
    CommittedTransaction, Transaction, TransactionState, UndoEntry, UndoHistory, UndoOp,
    UndoOutcome,
};
use crate::types::{unix_now, EntityKind, TransactionId};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// A reference to a record that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DanglingReference {
    /// Kind of the record holding the reference.
    pub owner_kind: EntityKind,
    /// Record holding the reference.
    pub owner: Handle,
    /// Kind of the missing record.
    pub target_kind: EntityKind,
    /// The missing handle.
    pub target: Handle,
}

/// Overview of a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbSummary {
    /// Directory, `None` for an in-memory database.
    pub path: Option<PathBuf>,
    /// Schema version.
    pub schema_version: u32,
    /// Live records per kind.
    pub counts: BTreeMap<EntityKind, usize>,
    /// Distinct surnames.
    pub surnames: usize,
    /// Undoable transactions.
    pub undo_len: usize,
    /// Redoable transactions.
    pub redo_len: usize,
    /// Whether writes are refused.
    pub read_only: bool,
    /// Home person, if set.
    pub default_person: Option<Handle>,
}

/// Which way a history entry is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    Commit,
    Undo,
    Redo,
}

/// The genealogical database.
///
/// Holds one table per record kind, the undo history and a signal bus. All
/// methods take `&self`; a single logical thread is expected to drive
/// mutations, and only one transaction may be open at a time.
///
/// # Example
///
/// ```rust
/// use genedb_core::{Database, DbRead, DbWrite, Name, Person};
///
/// let db = Database::open_in_memory();
/// let handle = db
///     .with_transaction("add person", false, |db, txn| {
///         db.add_person(Person::new(Name::new("Ada", "Byron")), txn)
///     })
///     .unwrap();
///
/// let person = db.get_person_from_handle(handle).unwrap();
/// assert_eq!(person.gramps_id, "I0000");
/// assert_eq!(db.get_person_from_id("I0000").unwrap(), person);
/// ```
pub struct Database {
    instance: Uuid,
    config: Config,
    tables: RwLock<Tables>,
    history: Mutex<UndoHistory>,
    metadata: Mutex<Metadata>,
    signals: SignalBus<DbSignal>,
    open_txn: Arc<Mutex<Option<TransactionId>>>,
    next_txn: AtomicU64,
    dir: Option<DatabaseDir>,
}

impl Database {
    /// Opens a database directory with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`Database::open_with_config`].
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a database directory.
    ///
    /// A database written by an older schema is upgraded first when
    /// `auto_upgrade` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Another process has the database locked (`DatabaseLocked`)
    /// - The directory holds no database and `create_if_missing` is false
    /// - The schema is newer, or older with `auto_upgrade` off or
    ///   `read_only` on (`SchemaMismatch`)
    /// - A table file cannot be decoded
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        let dir = DatabaseDir::open(path, config.create_if_missing && !config.read_only)?;

        if dir.is_new_database() {
            if !config.create_if_missing || config.read_only {
                return Err(CoreError::invalid_format(format!(
                    "no database in {}",
                    path.display()
                )));
            }
            let metadata = Metadata::new();
            metadata.store(&mut dir.metadata_backend()?)?;
            info!(path = %path.display(), "database created");
            return Ok(Self::assemble(config, Some(dir), Tables::new(), metadata, Vec::new()));
        }

        let mut metadata = Metadata::load(&dir.metadata_backend()?)?
            .ok_or_else(|| CoreError::invalid_format("database has no metadata"))?;
        if metadata.schema_version != SCHEMA_VERSION {
            if metadata.schema_version > SCHEMA_VERSION || !config.auto_upgrade || config.read_only {
                return Err(CoreError::SchemaMismatch {
                    found: metadata.schema_version,
                    expected: SCHEMA_VERSION,
                });
            }
            MigrationManager::with_builtin().run(&dir)?;
            metadata = Metadata::load(&dir.metadata_backend()?)?
                .ok_or_else(|| CoreError::invalid_format("database has no metadata"))?;
        }

        let mut tables = Tables::new();
        for kind in EntityKind::ALL {
            with_kind!(kind, T => {
                *T::table_mut(&mut tables) = persist::load_table::<T>(&dir.table_backend(kind)?)?;
            });
        }
        let history = persist::load_history(&dir.undo_backend()?)?;

        info!(
            path = %path.display(),
            people = tables.person.len(),
            families = tables.family.len(),
            read_only = config.read_only,
            "database opened"
        );
        Ok(Self::assemble(config, Some(dir), tables, metadata, history))
    }

    /// An empty database that lives only in memory.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::open_in_memory_with_config(Config::default())
    }

    /// An empty in-memory database with custom configuration.
    #[must_use]
    pub fn open_in_memory_with_config(config: Config) -> Self {
        Self::assemble(config, None, Tables::new(), Metadata::new(), Vec::new())
    }

    fn assemble(
        config: Config,
        dir: Option<DatabaseDir>,
        tables: Tables,
        metadata: Metadata,
        history: Vec<CommittedTransaction>,
    ) -> Self {
        let signals = SignalBus::with_gate(config.signal_gate.clone().unwrap_or_default());
        for (kind, shape) in DbSignal::declarations() {
            signals.declare(kind, shape);
        }
        let next_txn = history.iter().map(|t| t.id.as_u64()).max().unwrap_or(0) + 1;
        let mut undo = UndoHistory::new(config.undo_history_size);
        undo.restore(history);
        Self {
            instance: Uuid::new_v4(),
            config,
            tables: RwLock::new(tables),
            history: Mutex::new(undo),
            metadata: Mutex::new(metadata),
            signals,
            open_txn: Arc::new(Mutex::new(None)),
            next_txn: AtomicU64::new(next_txn),
            dir,
        }
    }

    /// Writes every table, the undo history and finally the metadata.
    /// Does nothing for an in-memory database.
    ///
    /// # Errors
    ///
    /// `ReadOnly` on a read-only database; I/O and codec errors otherwise.
    pub fn save(&self) -> CoreResult<()> {
        self.ensure_writable("save")?;
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        {
            let tables = self.tables.read();
            for kind in EntityKind::ALL {
                with_kind!(kind, T => {
                    persist::save_table(T::table(&tables), &mut dir.table_backend(kind)?)?;
                });
            }
        }
        persist::save_history(self.history.lock().iter(), &mut dir.undo_backend()?)?;
        let mut metadata = self.metadata.lock();
        metadata.saved = unix_now();
        metadata.store(&mut dir.metadata_backend()?)?;
        info!(path = %dir.path().display(), "database saved");
        Ok(())
    }

    /// Saves (unless read-only) and releases the directory lock.
    pub fn close(self) -> CoreResult<()> {
        if !self.config.read_only {
            self.save()?;
        }
        if let Some(dir) = &self.dir {
            info!(path = %dir.path().display(), "database closed");
        }
        Ok(())
    }

    /// Returns database configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory of the database, `None` when in memory.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(DatabaseDir::path)
    }

    /// Whether a transaction is open.
    #[must_use]
    pub fn has_open_transaction(&self) -> bool {
        self.open_txn.lock().is_some()
    }

    // ========================================================================
    // Signals
    // ========================================================================

    /// The database's signal bus.
    #[must_use]
    pub fn signals(&self) -> &SignalBus<DbSignal> {
        &self.signals
    }

    /// Registers a listener. See [`SignalBus::connect`].
    pub fn connect<F>(&self, kind: DbSignalKind, listener: F) -> CoreResult<ListenerId>
    where
        F: Fn(&DbSignal) + Send + Sync + 'static,
    {
        self.signals.connect(kind, listener)
    }

    /// Removes a listener.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        self.signals.disconnect(id)
    }

    /// Stops signal delivery until [`Database::enable_signals`].
    pub fn disable_signals(&self) {
        self.signals.disable();
    }

    /// Undoes one [`Database::disable_signals`].
    pub fn enable_signals(&self) {
        self.signals.enable();
    }

    /// Stops signal delivery until the guard is dropped.
    #[must_use = "signals are re-enabled as soon as the guard is dropped"]
    pub fn suppress_signals(&self) -> SuppressionGuard {
        self.signals.suppress()
    }

    fn emit(&self, signal: DbSignal) {
        if let Err(e) = self.signals.emit(&signal) {
            error!(error = %e, ?signal, "database signal rejected");
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Reads a record as the transaction sees it: its own pending writes
    /// first, then the committed tables.
    pub fn get_in_txn<T: Record>(&self, handle: Handle, txn: &Transaction) -> CoreResult<T> {
        match txn.pending(T::KIND, handle) {
            Some(Some(bytes)) => Ok(genedb_codec::from_cbor(bytes)?),
            Some(None) => Err(CoreError::not_found(T::KIND, handle)),
            None => self.get_from_handle(handle),
        }
    }

    /// Live records of a kind.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        self.tables.read().count(kind)
    }

    /// Public ids in use for a kind, sorted.
    #[must_use]
    pub fn ids(&self, kind: EntityKind) -> Vec<String> {
        self.tables.read().ids(kind)
    }

    /// The id `add` would assign next to a record of `kind`.
    #[must_use]
    pub fn find_next_id(&self, kind: EntityKind) -> String {
        self.next_free_id(kind, &self.tables.read(), None).0
    }

    /// Distinct surnames of all people, sorted.
    #[must_use]
    pub fn surnames(&self) -> Vec<String> {
        self.tables.read().surnames()
    }

    /// Every reference pointing at a handle that is not live.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let tables = self.tables.read();
        let mut out = Vec::new();
        for owner_kind in EntityKind::ALL {
            for (owner, (target_kind, target)) in tables.references_of(owner_kind) {
                if !tables.contains(target_kind, &target) {
                    out.push(DanglingReference {
                        owner_kind,
                        owner,
                        target_kind,
                        target,
                    });
                }
            }
        }
        out.sort();
        out
    }

    /// Counts, schema version and history sizes.
    #[must_use]
    pub fn summary(&self) -> DbSummary {
        let tables = self.tables.read();
        let history = self.history.lock();
        let metadata = self.metadata.lock();
        DbSummary {
            path: self.path().map(Path::to_path_buf),
            schema_version: metadata.schema_version,
            counts: EntityKind::ALL.iter().map(|k| (*k, tables.count(*k))).collect(),
            surnames: tables.surnames().len(),
            undo_len: history.undo_len(),
            redo_len: history.redo_len(),
            read_only: self.config.read_only,
            default_person: metadata
                .default_person
                .filter(|h| tables.contains(EntityKind::Person, h)),
        }
    }

    /// Label of the transaction [`DbWrite::undo`] would revert.
    #[must_use]
    pub fn undo_label(&self) -> Option<String> {
        self.history.lock().undo_label().map(str::to_string)
    }

    /// Label of the transaction [`DbWrite::redo`] would reapply.
    #[must_use]
    pub fn redo_label(&self) -> Option<String> {
        self.history.lock().redo_label().map(str::to_string)
    }

    /// Undoable transactions, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<CommittedTransaction> {
        self.history.lock().iter().cloned().collect()
    }

    // ========================================================================
    // Mutation helpers
    // ========================================================================

    /// Like [`DbWrite::remove`], but refuses while other records, committed
    /// or pending in `txn`, still reference the handle.
    ///
    /// # Errors
    ///
    /// `ReferentialDangling` listing the referrers.
    pub fn remove_checked<T: Record>(&self, handle: Handle, txn: &mut Transaction) -> CoreResult<()> {
        self.ensure_writable("remove")?;
        txn.check_owner(self.instance)?;
        let referrers = self.referrers_in_txn(handle, txn)?;
        let referrers: Vec<_> = referrers
            .into_iter()
            .filter(|r| *r != (T::KIND, handle))
            .collect();
        if !referrers.is_empty() {
            return Err(CoreError::ReferentialDangling {
                kind: T::KIND,
                handle,
                referrers,
            });
        }
        self.remove::<T>(handle, txn)
    }

    fn referrers_in_txn(&self, handle: Handle, txn: &Transaction) -> CoreResult<Vec<(EntityKind, Handle)>> {
        let tables = self.tables.read();
        let mut found: BTreeSet<(EntityKind, Handle)> = tables
            .referrers(handle, &EntityKind::ALL)
            .into_iter()
            .filter(|(kind, owner)| txn.pending(*kind, *owner).is_none())
            .collect();
        for (kind, owner, bytes) in txn.pending_records() {
            let record = AnyRecord::decode(kind, bytes)?;
            if record.references().iter().any(|(_, h)| *h == handle) {
                found.insert((kind, owner));
            }
        }
        Ok(found.into_iter().collect())
    }

    fn ensure_writable(&self, operation: &str) -> CoreResult<()> {
        if self.config.read_only {
            Err(CoreError::read_only(operation))
        } else {
            Ok(())
        }
    }

    fn ensure_no_open_transaction(&self, operation: &str) -> CoreResult<()> {
        match *self.open_txn.lock() {
            Some(id) => Err(CoreError::invalid_transition(format!(
                "{operation} while {id} is open"
            ))),
            None => Ok(()),
        }
    }

    /// First free id for `kind` at or after the stored counter, and the
    /// counter value it uses.
    fn next_free_id(&self, kind: EntityKind, tables: &Tables, txn: Option<&Transaction>) -> (String, u64) {
        let prefix = self.config.prefix_for(kind);
        let mut n = self.metadata.lock().counter(kind);
        loop {
            let id = prefix.format(n);
            let taken = match txn.and_then(|t| t.id_claim(kind, &id)) {
                Some(owner) => owner.is_some(),
                None => tables.id_owner(kind, &id).is_some(),
            };
            if !taken {
                return (id, n);
            }
            n += 1;
        }
    }

    /// Prior bytes and public id of a record as `txn` sees it.
    fn prior_state<T: Record>(
        tables: &Tables,
        txn: &Transaction,
        handle: Handle,
    ) -> CoreResult<(Option<Vec<u8>>, Option<String>)> {
        match txn.pending(T::KIND, handle) {
            Some(Some(bytes)) => Ok((
                Some(bytes.to_vec()),
                txn.pending_id(T::KIND, handle).flatten().map(str::to_string),
            )),
            Some(None) => Ok((None, None)),
            None => match tables.table::<T>().get(&handle) {
                Some(record) => Ok((
                    Some(genedb_codec::to_cbor(record)?),
                    Some(record.gramps_id().to_string()),
                )),
                None => Ok((None, None)),
            },
        }
    }

    /// Validates a create or update and buffers it in `txn`. A record with
    /// no prior value is a create, whether it came through `add` or
    /// `commit`; only `add` assigns a missing public id.
    fn buffer_write<T: Record>(
        &self,
        mut record: T,
        txn: &mut Transaction,
        change_time: Option<i64>,
        creating: bool,
    ) -> CoreResult<Handle> {
        let handle = record
            .handle()
            .ok_or(CoreError::MissingHandle { kind: T::KIND })?;
        let tables = self.tables.read();
        let (prior, prior_id) = Self::prior_state::<T>(&tables, txn, handle)?;
        match &prior {
            Some(_) if creating => {
                return Err(CoreError::invalid_transition(format!(
                    "{} {handle} already exists",
                    T::KIND
                )))
            }
            None if txn.pending(T::KIND, handle).is_some()
                || self.metadata.lock().retired.contains(&handle) =>
            {
                return Err(CoreError::HandleRetired {
                    kind: T::KIND,
                    handle,
                })
            }
            _ => {}
        }

        if creating && record.gramps_id().is_empty() {
            let (id, n) = self.next_free_id(T::KIND, &tables, Some(&*txn));
            record.set_gramps_id(id);
            self.metadata.lock().id_counters.insert(T::KIND, n + 1);
        }

        let id = record.gramps_id().to_string();
        if !id.is_empty() {
            let owner = txn
                .id_claim(T::KIND, &id)
                .unwrap_or_else(|| tables.table::<T>().handle_for_id(&id));
            if let Some(existing) = owner.filter(|o| *o != handle) {
                return Err(CoreError::IdCollision {
                    kind: T::KIND,
                    id,
                    existing,
                });
            }
        }
        drop(tables);

        record.set_change(change_time.unwrap_or_else(unix_now));
        let new = genedb_codec::to_cbor(&record)?;
        let op = if prior.is_some() { UndoOp::Update } else { UndoOp::Create };
        debug!(txn = %txn.id(), kind = %T::KIND, %handle, %id, ?op, "write buffered");
        txn.record(
            UndoEntry {
                kind: T::KIND,
                handle,
                op,
                prior,
                new: Some(new),
            },
            prior_id,
            Some(id),
        );
        Ok(handle)
    }

    /// Decodes the side of each entry that a replay writes, in apply order.
    fn replay_records(
        txn: &CommittedTransaction,
        replay: Replay,
    ) -> CoreResult<Vec<(EntityKind, Handle, Option<AnyRecord>)>> {
        let decode = |e: &UndoEntry, bytes: &Option<Vec<u8>>| -> CoreResult<_> {
            let record = bytes
                .as_deref()
                .map(|b| AnyRecord::decode(e.kind, b))
                .transpose()?;
            Ok((e.kind, e.handle, record))
        };
        match replay {
            Replay::Undo => txn.entries.iter().rev().map(|e| decode(e, &e.prior)).collect(),
            Replay::Commit | Replay::Redo => txn.entries.iter().map(|e| decode(e, &e.new)).collect(),
        }
    }

    fn apply_records(&self, records: Vec<(EntityKind, Handle, Option<AnyRecord>)>) {
        let mut tables = self.tables.write();
        let mut metadata = self.metadata.lock();
        for (kind, handle, record) in records {
            if record.is_none() {
                metadata.retired.insert(handle);
            }
            tables.apply(kind, handle, record);
        }
    }

    /// Announces the current top of both history stacks. Read after the
    /// change signals, since a listener may have committed in between.
    fn emit_history_labels(&self) {
        let (undo_label, redo_label) = {
            let history = self.history.lock();
            (
                history.undo_label().map(str::to_string),
                history.redo_label().map(str::to_string),
            )
        };
        self.emit(DbSignal::UndoAvailable(undo_label));
        self.emit(DbSignal::RedoAvailable(redo_label));
    }

    /// Signals describing a replay: one per entry, or one `Rebuilt` per
    /// kind for batch transactions.
    fn change_signals(txn: &CommittedTransaction, replay: Replay) -> Vec<DbSignal> {
        if txn.batch {
            return txn.kinds().into_iter().map(|kind| DbSignal::Rebuilt { kind }).collect();
        }
        let signal = |e: &UndoEntry| {
            let (kind, handle) = (e.kind, e.handle);
            let (before, after) = match replay {
                Replay::Undo => (e.new.is_some(), e.prior.is_some()),
                Replay::Commit | Replay::Redo => (e.prior.is_some(), e.new.is_some()),
            };
            match (before, after) {
                (false, _) => DbSignal::Added { kind, handle },
                (true, false) => DbSignal::Deleted { kind, handle },
                (true, true) => DbSignal::Updated { kind, handle },
            }
        };
        match replay {
            Replay::Undo => txn.entries.iter().rev().map(signal).collect(),
            Replay::Commit | Replay::Redo => txn.entries.iter().map(signal).collect(),
        }
    }

    fn replay(&self, replay: Replay) -> CoreResult<UndoOutcome> {
        let operation = if replay == Replay::Undo { "undo" } else { "redo" };
        self.ensure_writable(operation)?;
        self.ensure_no_open_transaction(operation)?;

        let popped = {
            let mut history = self.history.lock();
            if replay == Replay::Undo {
                history.pop_undo()
            } else {
                history.pop_redo()
            }
        };
        let Some(txn) = popped else {
            return Ok(if replay == Replay::Undo {
                UndoOutcome::NothingToUndo
            } else {
                UndoOutcome::NothingToRedo
            });
        };

        let records = match Self::replay_records(&txn, replay) {
            Ok(records) => records,
            Err(e) => {
                let mut history = self.history.lock();
                if replay == Replay::Undo {
                    history.push_undo(txn);
                } else {
                    history.push_redo(txn);
                }
                return Err(e);
            }
        };
        self.apply_records(records);

        let signals = Self::change_signals(&txn, replay);
        let label = txn.label.clone();
        {
            let mut history = self.history.lock();
            if replay == Replay::Undo {
                history.push_redo(txn);
            } else {
                history.push_undo(txn);
            }
        }
        info!(%label, operation, "history replayed");

        for signal in signals {
            self.emit(signal);
        }
        self.emit_history_labels();

        Ok(if replay == Replay::Undo {
            UndoOutcome::Undone(label)
        } else {
            UndoOutcome::Redone(label)
        })
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path())
            .field("read_only", &self.config.read_only)
            .field("open_transaction", &*self.open_txn.lock())
            .finish_non_exhaustive()
    }
}

impl DbRead for Database {
    fn get_from_handle<T: Record>(&self, handle: Handle) -> CoreResult<T> {
        self.tables
            .read()
            .table::<T>()
            .get(&handle)
            .cloned()
            .ok_or_else(|| CoreError::not_found(T::KIND, handle))
    }

    fn get_from_id<T: Record>(&self, id: &str) -> CoreResult<T> {
        let tables = self.tables.read();
        let table = tables.table::<T>();
        table
            .handle_for_id(id)
            .and_then(|h| table.get(&h).cloned())
            .ok_or_else(|| CoreError::not_found(T::KIND, id))
    }

    fn handles<T: Record>(&self, sorted: bool) -> Vec<Handle> {
        self.tables.read().table::<T>().handles(sorted)
    }

    fn has_handle(&self, kind: EntityKind, handle: Handle) -> bool {
        self.tables.read().contains(kind, &handle)
    }

    fn find_backlink_handles(
        &self,
        handle: Handle,
        kinds: Option<&[EntityKind]>,
    ) -> Vec<(EntityKind, Handle)> {
        self.tables
            .read()
            .referrers(handle, kinds.unwrap_or(&EntityKind::ALL))
    }

    fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    fn default_handle(&self) -> Option<Handle> {
        let handle = self.metadata.lock().default_person?;
        self.has_handle(EntityKind::Person, handle).then_some(handle)
    }

    fn bookmarks(&self, kind: EntityKind) -> Vec<Handle> {
        let marks = self.metadata.lock().bookmarks.get(&kind).cloned().unwrap_or_default();
        let tables = self.tables.read();
        marks.into_iter().filter(|h| tables.contains(kind, h)).collect()
    }
}

impl DbWrite for Database {
    fn transaction_begin(&self, batch: bool) -> CoreResult<Transaction> {
        self.ensure_writable("transaction_begin")?;
        let mut slot = self.open_txn.lock();
        if let Some(open) = *slot {
            return Err(CoreError::invalid_transition(format!(
                "cannot begin a transaction while {open} is open"
            )));
        }
        let id = TransactionId::new(self.next_txn.fetch_add(1, Ordering::SeqCst));
        *slot = Some(id);
        drop(slot);

        let suppression = batch.then(|| self.signals.suppress());
        debug!(txn = %id, batch, "transaction begun");
        Ok(Transaction::new(
            id,
            self.instance,
            batch,
            Arc::clone(&self.open_txn),
            suppression,
        ))
    }

    fn transaction_commit(&self, mut txn: Transaction, label: &str) -> CoreResult<()> {
        txn.check_owner(self.instance)?;
        let id = txn.id();
        let batch = txn.is_batch();
        let entries = txn.finish(TransactionState::Committed);
        if entries.is_empty() {
            debug!(txn = %id, label, "empty transaction closed");
            return Ok(());
        }

        let committed = CommittedTransaction {
            id,
            label: label.to_string(),
            batch,
            timestamp: unix_now(),
            entries,
        };
        let records = Self::replay_records(&committed, Replay::Commit)?;
        self.apply_records(records);

        let signals = Self::change_signals(&committed, Replay::Commit);
        debug!(txn = %id, label, entries = committed.entries.len(), "transaction committed");
        self.history.lock().push(committed);

        for signal in signals {
            self.emit(signal);
        }
        self.emit_history_labels();
        Ok(())
    }

    fn transaction_abort(&self, mut txn: Transaction) -> CoreResult<()> {
        txn.check_owner(self.instance)?;
        let discarded = txn.finish(TransactionState::Aborted);
        debug!(txn = %txn.id(), discarded = discarded.len(), "transaction aborted");
        Ok(())
    }

    fn add<T: Record>(&self, mut record: T, txn: &mut Transaction) -> CoreResult<Handle> {
        self.ensure_writable("add")?;
        txn.check_owner(self.instance)?;
        if record.handle().is_none() {
            record.set_handle(Handle::new());
        }
        self.buffer_write(record, txn, None, true)
    }

    fn commit<T: Record>(
        &self,
        record: T,
        txn: &mut Transaction,
        change_time: Option<i64>,
    ) -> CoreResult<()> {
        self.ensure_writable("commit")?;
        txn.check_owner(self.instance)?;
        self.buffer_write(record, txn, change_time, false).map(|_| ())
    }

    fn remove<T: Record>(&self, handle: Handle, txn: &mut Transaction) -> CoreResult<()> {
        self.ensure_writable("remove")?;
        txn.check_owner(self.instance)?;
        let (prior, prior_id) = Self::prior_state::<T>(&self.tables.read(), txn, handle)?;
        let Some(prior) = prior else {
            return Err(CoreError::not_found(T::KIND, handle));
        };
        debug!(txn = %txn.id(), kind = %T::KIND, %handle, "removal buffered");
        txn.record(
            UndoEntry {
                kind: T::KIND,
                handle,
                op: UndoOp::Delete,
                prior: Some(prior),
                new: None,
            },
            prior_id,
            None,
        );
        Ok(())
    }

    fn undo(&self) -> CoreResult<UndoOutcome> {
        self.replay(Replay::Undo)
    }

    fn redo(&self) -> CoreResult<UndoOutcome> {
        self.replay(Replay::Redo)
    }

    fn set_default_person_handle(&self, handle: Option<Handle>) -> CoreResult<()> {
        self.ensure_writable("set_default_person_handle")?;
        if let Some(h) = handle.filter(|h| !self.has_handle(EntityKind::Person, *h)) {
            return Err(CoreError::not_found(EntityKind::Person, h));
        }
        let previous = std::mem::replace(&mut self.metadata.lock().default_person, handle);
        if previous != handle {
            debug!(?handle, "home person changed");
            self.emit(DbSignal::HomePersonChanged);
        }
        Ok(())
    }

    fn set_bookmarks(&self, kind: EntityKind, handles: Vec<Handle>) -> CoreResult<()> {
        self.ensure_writable("set_bookmarks")?;
        let mut marks = Vec::with_capacity(handles.len());
        {
            let tables = self.tables.read();
            for handle in handles {
                if !tables.contains(kind, &handle) {
                    return Err(CoreError::not_found(kind, handle));
                }
                if !marks.contains(&handle) {
                    marks.push(handle);
                }
            }
        }
        debug!(%kind, count = marks.len(), "bookmarks replaced");
        let mut metadata = self.metadata.lock();
        if marks.is_empty() {
            metadata.bookmarks.remove(&kind);
        } else {
            metadata.bookmarks.insert(kind, marks);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Event, EventRef, EventType, Family, Name, Person, Place};

    const ALL_SIGNALS: [DbSignalKind; 6] = [
        DbSignalKind::Added,
        DbSignalKind::Updated,
        DbSignalKind::Deleted,
        DbSignalKind::Rebuilt,
        DbSignalKind::UndoAvailable,
        DbSignalKind::RedoAvailable,
    ];

    fn record_signals(db: &Database) -> Arc<Mutex<Vec<DbSignal>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for kind in ALL_SIGNALS {
            let log = Arc::clone(&log);
            db.connect(kind, move |s| log.lock().push(s.clone())).unwrap();
        }
        log
    }

    fn person(first: &str, surname: &str) -> Person {
        Person::new(Name::new(first, surname))
    }

    fn add_person(db: &Database, first: &str) -> Handle {
        db.with_transaction("add person", false, |db, txn| {
            db.add_person(person(first, "Smith"), txn)
        })
        .unwrap()
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let db = Database::open_in_memory();
        let a = add_person(&db, "Ann");
        let b = add_person(&db, "Bob");
        assert_eq!(db.get_person_from_handle(a).unwrap().gramps_id, "I0000");
        assert_eq!(db.get_person_from_handle(b).unwrap().gramps_id, "I0001");
        assert_eq!(db.find_next_id(EntityKind::Person), "I0002");
        assert_eq!(db.find_next_id(EntityKind::Family), "F0000");
    }

    #[test]
    fn explicit_id_is_kept_and_skipped_by_counter() {
        let db = Database::open_in_memory();
        db.with_transaction("add", false, |db, txn| {
            let mut p = person("Ann", "Smith");
            p.gramps_id = "I0000".into();
            db.add_person(p, txn)?;
            db.add_person(person("Bob", "Smith"), txn)
        })
        .unwrap();
        assert_eq!(db.ids(EntityKind::Person), vec!["I0000", "I0001"]);
    }

    #[test]
    fn add_stamps_change_time() {
        let db = Database::open_in_memory();
        let h = add_person(&db, "Ann");
        assert!(db.get_person_from_handle(h).unwrap().change > 0);
    }

    #[test]
    fn commit_of_unknown_handle_creates_record() {
        let db = Database::open_in_memory();
        let log = record_signals(&db);
        let h = Handle::new();
        db.with_transaction("import", false, |db, txn| {
            let mut p = person("Ann", "Smith");
            p.handle = Some(h);
            p.gramps_id = "I0001".into();
            db.commit_person(p, txn)
        })
        .unwrap();

        assert_eq!(db.get_person_from_id("I0001").unwrap().handle, Some(h));
        assert_eq!(log.lock()[0], DbSignal::Added { kind: EntityKind::Person, handle: h });
        assert_eq!(db.history()[0].entries[0].op, UndoOp::Create);

        db.undo().unwrap();
        assert!(db.get_person_from_handle(h).unwrap_err().is_not_found());
    }

    #[test]
    fn commit_of_unknown_handle_checks_id_collision() {
        let db = Database::open_in_memory();
        add_person(&db, "Ann");
        let mut txn = db.transaction_begin(false).unwrap();
        let mut p = person("Bob", "Smith");
        p.handle = Some(Handle::new());
        p.gramps_id = "I0000".into();
        let err = db.commit_person(p, &mut txn).unwrap_err();
        assert!(matches!(err, CoreError::IdCollision { .. }));
    }

    #[test]
    fn removed_handle_is_never_reused() {
        let db = Database::open_in_memory();
        let h = add_person(&db, "Ann");
        db.with_transaction("remove", false, |db, txn| db.remove_person(h, txn))
            .unwrap();

        let mut txn = db.transaction_begin(false).unwrap();
        let mut p = person("Other", "Smith");
        p.handle = Some(h);
        let err = db.add_person(p.clone(), &mut txn).unwrap_err();
        assert!(matches!(err, CoreError::HandleRetired { handle, .. } if handle == h));
        let err = db.commit_person(p, &mut txn).unwrap_err();
        assert!(matches!(err, CoreError::HandleRetired { .. }));
        db.transaction_abort(txn).unwrap();

        // Undo brings the original record back under its own handle.
        db.undo().unwrap();
        assert_eq!(db.get_person_from_handle(h).unwrap().primary_name.first_name, "Ann");
    }

    #[test]
    fn handle_removed_in_open_transaction_is_retired() {
        let db = Database::open_in_memory();
        let mut txn = db.transaction_begin(false).unwrap();
        let h = db.add_person(person("Ann", "Smith"), &mut txn).unwrap();
        db.remove_person(h, &mut txn).unwrap();
        let mut again = person("Ann", "Smith");
        again.handle = Some(h);
        let err = db.add_person(again, &mut txn).unwrap_err();
        assert!(matches!(err, CoreError::HandleRetired { .. }));
    }

    #[test]
    fn undone_create_retires_its_handle() {
        let db = Database::open_in_memory();
        let h = add_person(&db, "Ann");
        db.undo().unwrap();
        let mut txn = db.transaction_begin(false).unwrap();
        let mut p = person("Ann", "Smith");
        p.handle = Some(h);
        assert!(matches!(
            db.add_person(p, &mut txn),
            Err(CoreError::HandleRetired { .. })
        ));
    }

    #[test]
    fn commit_without_handle_is_rejected() {
        let db = Database::open_in_memory();
        let mut txn = db.transaction_begin(false).unwrap();
        let err = db.commit_person(person("Ann", "Smith"), &mut txn).unwrap_err();
        assert!(matches!(err, CoreError::MissingHandle { kind: EntityKind::Person }));
    }

    #[test]
    fn commit_updates_and_uses_explicit_change_time() {
        let db = Database::open_in_memory();
        let h = add_person(&db, "Ann");
        db.with_transaction("rename", false, |db, txn| {
            let mut p = db.get_person_from_handle(h)?;
            p.primary_name.first_name = "Anna".into();
            db.commit(p, txn, Some(42))
        })
        .unwrap();
        let p = db.get_person_from_handle(h).unwrap();
        assert_eq!(p.primary_name.first_name, "Anna");
        assert_eq!(p.change, 42);
    }

    #[test]
    fn adding_an_existing_handle_is_rejected() {
        let db = Database::open_in_memory();
        let h = add_person(&db, "Ann");
        let mut txn = db.transaction_begin(false).unwrap();
        let mut p = person("Other", "Smith");
        p.handle = Some(h);
        let err = db.add_person(p, &mut txn).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn id_collision_is_rejected() {
        let db = Database::open_in_memory();
        let ann = add_person(&db, "Ann");
        let mut txn = db.transaction_begin(false).unwrap();
        let mut p = person("Bob", "Smith");
        p.gramps_id = "I0000".into();
        match db.add_person(p, &mut txn).unwrap_err() {
            CoreError::IdCollision { id, existing, .. } => {
                assert_eq!(id, "I0000");
                assert_eq!(existing, ann);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn id_released_in_transaction_can_be_reused() {
        let db = Database::open_in_memory();
        let ann = add_person(&db, "Ann");
        db.with_transaction("swap", false, |db, txn| {
            let mut a = db.get_person_from_handle(ann)?;
            a.gramps_id = "I0100".into();
            db.commit_person(a, txn)?;
            let mut b = person("Bob", "Smith");
            b.gramps_id = "I0000".into();
            db.add_person(b, txn)
        })
        .unwrap();
        assert_eq!(db.get_person_from_id("I0100").unwrap().handle, Some(ann));
        assert_eq!(db.get_person_from_id("I0000").unwrap().primary_name.first_name, "Bob");
    }

    #[test]
    fn only_one_transaction_at_a_time() {
        let db = Database::open_in_memory();
        let txn = db.transaction_begin(false).unwrap();
        assert!(db.has_open_transaction());
        let err = db.transaction_begin(false).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        db.transaction_abort(txn).unwrap();
        assert!(!db.has_open_transaction());
        drop(db.transaction_begin(false).unwrap());
        assert!(!db.has_open_transaction());
    }

    #[test]
    fn abort_discards_buffered_writes() {
        let db = Database::open_in_memory();
        let mut txn = db.transaction_begin(false).unwrap();
        let h = db.add_person(person("Ann", "Smith"), &mut txn).unwrap();
        assert!(db.get_in_txn::<Person>(h, &txn).is_ok());
        assert!(db.get_person_from_handle(h).is_err());
        db.transaction_abort(txn).unwrap();
        assert!(db.get_person_from_handle(h).is_err());
        assert_eq!(db.undo_label(), None);
    }

    #[test]
    fn transaction_of_another_database_is_rejected() {
        let a = Database::open_in_memory();
        let b = Database::open_in_memory();
        let mut txn = a.transaction_begin(false).unwrap();
        let err = b.add_person(person("Ann", "Smith"), &mut txn).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn add_then_remove_in_one_transaction() {
        let db = Database::open_in_memory();
        let log = record_signals(&db);
        db.with_transaction("noop", false, |db, txn| {
            let h = db.add_person(person("Ann", "Smith"), txn)?;
            db.remove_person(h, txn)?;
            assert!(db.get_in_txn::<Person>(h, txn).unwrap_err().is_not_found());
            Ok(())
        })
        .unwrap();
        assert_eq!(db.number_of::<Person>(), 0);
        let log = log.lock();
        assert!(matches!(log[0], DbSignal::Added { .. }));
        assert!(matches!(log[1], DbSignal::Deleted { .. }));
    }

    #[test]
    fn remove_missing_is_not_found() {
        let db = Database::open_in_memory();
        let mut txn = db.transaction_begin(false).unwrap();
        assert!(db.remove_person(Handle::new(), &mut txn).unwrap_err().is_not_found());
    }

    #[test]
    fn commit_emits_one_signal_per_entry_then_history() {
        let db = Database::open_in_memory();
        let h = add_person(&db, "Ann");
        let log = record_signals(&db);
        let f = db
            .with_transaction("edit", false, |db, txn| {
                let mut p = db.get_person_from_handle(h)?;
                let f = db.add_family(Family::new(Some(h), None), txn)?;
                p.family_list.push(f);
                db.commit_person(p, txn)?;
                Ok(f)
            })
            .unwrap();
        assert_eq!(
            *log.lock(),
            vec![
                DbSignal::Added { kind: EntityKind::Family, handle: f },
                DbSignal::Updated { kind: EntityKind::Person, handle: h },
                DbSignal::UndoAvailable(Some("edit".into())),
                DbSignal::RedoAvailable(None),
            ]
        );
    }

    #[test]
    fn empty_transaction_leaves_no_trace() {
        let db = Database::open_in_memory();
        let log = record_signals(&db);
        db.with_transaction("nothing", false, |_, _| Ok(())).unwrap();
        assert!(log.lock().is_empty());
        assert_eq!(db.undo_label(), None);
    }

    #[test]
    fn batch_emits_rebuilt_per_kind() {
        let db = Database::open_in_memory();
        let log = record_signals(&db);
        db.with_transaction("import", true, |db, txn| {
            let place = db.add_place(Place::new("Boston"), txn)?;
            db.add_event(Event::new(EventType::Birth).with_place(place), txn)?;
            db.add_person(person("Ann", "Smith"), txn)?;
            db.add_person(person("Bob", "Smith"), txn)?;
            Ok(())
        })
        .unwrap();
        let log = log.lock();
        let rebuilt: Vec<_> = log
            .iter()
            .filter_map(|s| match s {
                DbSignal::Rebuilt { kind } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(rebuilt, vec![EntityKind::Person, EntityKind::Event, EntityKind::Place]);
        assert_eq!(log.len(), 5);
        assert!(db.signals().is_enabled());
    }

    #[test]
    fn undo_and_redo_roundtrip() {
        let db = Database::open_in_memory();
        let h = add_person(&db, "Ann");
        db.with_transaction("rename", false, |db, txn| {
            let mut p = db.get_person_from_handle(h)?;
            p.primary_name.first_name = "Anna".into();
            db.commit_person(p, txn)
        })
        .unwrap();

        assert_eq!(db.undo().unwrap(), UndoOutcome::Undone("rename".into()));
        assert_eq!(db.get_person_from_handle(h).unwrap().primary_name.first_name, "Ann");
        assert_eq!(db.undo().unwrap(), UndoOutcome::Undone("add person".into()));
        assert!(db.get_person_from_handle(h).is_err());
        assert!(db.get_person_from_id("I0000").is_err());
        assert_eq!(db.undo().unwrap(), UndoOutcome::NothingToUndo);

        assert_eq!(db.redo().unwrap(), UndoOutcome::Redone("add person".into()));
        assert_eq!(db.redo().unwrap(), UndoOutcome::Redone("rename".into()));
        assert_eq!(db.get_person_from_handle(h).unwrap().primary_name.first_name, "Anna");
        assert_eq!(db.redo().unwrap(), UndoOutcome::NothingToRedo);
    }

    #[test]
    fn undo_signals_mirror_the_commit() {
        let db = Database::open_in_memory();
        let h = add_person(&db, "Ann");
        let log = record_signals(&db);
        db.undo().unwrap();
        assert_eq!(
            *log.lock(),
            vec![
                DbSignal::Deleted { kind: EntityKind::Person, handle: h },
                DbSignal::UndoAvailable(None),
                DbSignal::RedoAvailable(Some("add person".into())),
            ]
        );
        log.lock().clear();
        db.redo().unwrap();
        assert_eq!(
            *log.lock(),
            vec![
                DbSignal::Added { kind: EntityKind::Person, handle: h },
                DbSignal::UndoAvailable(Some("add person".into())),
                DbSignal::RedoAvailable(None),
            ]
        );
    }

    #[test]
    fn new_commit_clears_redo() {
        let db = Database::open_in_memory();
        add_person(&db, "Ann");
        db.undo().unwrap();
        assert_eq!(db.redo_label().as_deref(), Some("add person"));
        add_person(&db, "Bob");
        assert_eq!(db.redo_label(), None);
        assert_eq!(db.redo().unwrap(), UndoOutcome::NothingToRedo);
    }

    #[test]
    fn undo_while_transaction_open_is_refused() {
        let db = Database::open_in_memory();
        add_person(&db, "Ann");
        let _txn = db.transaction_begin(false).unwrap();
        assert!(matches!(db.undo().unwrap_err(), CoreError::InvalidTransition { .. }));
        assert!(matches!(db.redo().unwrap_err(), CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn history_is_bounded() {
        let db = Database::open_in_memory_with_config(Config::new().undo_history_size(2));
        for name in ["A", "B", "C"] {
            add_person(&db, name);
        }
        assert_eq!(db.history().len(), 2);
        db.undo().unwrap();
        db.undo().unwrap();
        assert_eq!(db.undo().unwrap(), UndoOutcome::NothingToUndo);
        assert_eq!(db.number_of::<Person>(), 1);
    }

    #[test]
    fn read_only_refuses_writes() {
        let db = Database::open_in_memory_with_config(Config::new().read_only(true));
        assert!(db.is_read_only());
        assert!(matches!(db.transaction_begin(false).unwrap_err(), CoreError::ReadOnly { .. }));
        assert!(matches!(db.undo().unwrap_err(), CoreError::ReadOnly { .. }));
        assert!(matches!(db.save().unwrap_err(), CoreError::ReadOnly { .. }));
    }

    #[test]
    fn backlinks_and_checked_remove() {
        let db = Database::open_in_memory();
        let h = add_person(&db, "Ann");
        let event = db
            .with_transaction("birth", false, |db, txn| {
                let e = db.add_event(Event::new(EventType::Birth), txn)?;
                let mut p = db.get_person_from_handle(h)?;
                p.add_event_ref(EventRef::new(e));
                db.commit_person(p, txn)?;
                Ok(e)
            })
            .unwrap();

        assert_eq!(db.find_backlink_handles(event, None), vec![(EntityKind::Person, h)]);
        assert!(db.find_backlink_handles(event, Some(&[EntityKind::Family])).is_empty());

        let mut txn = db.transaction_begin(false).unwrap();
        match db.remove_checked::<Event>(event, &mut txn).unwrap_err() {
            CoreError::ReferentialDangling { referrers, .. } => {
                assert_eq!(referrers, vec![(EntityKind::Person, h)]);
            }
            other => panic!("unexpected error: {other}"),
        }
        let mut p = db.get_in_txn::<Person>(h, &txn).unwrap();
        p.remove_references(EntityKind::Event, &[event]);
        db.commit_person(p, &mut txn).unwrap();
        db.remove_checked::<Event>(event, &mut txn).unwrap();
        db.transaction_commit(txn, "drop birth").unwrap();
        assert!(db.dangling_references().is_empty());
    }

    #[test]
    fn unchecked_remove_leaves_dangling_reference() {
        let db = Database::open_in_memory();
        let father = add_person(&db, "Tom");
        let family = db
            .with_transaction("family", false, |db, txn| {
                db.add_family(Family::new(Some(father), None), txn)
            })
            .unwrap();
        db.with_transaction("remove", false, |db, txn| db.remove_person(father, txn))
            .unwrap();
        assert_eq!(
            db.dangling_references(),
            vec![DanglingReference {
                owner_kind: EntityKind::Family,
                owner: family,
                target_kind: EntityKind::Person,
                target: father,
            }]
        );
    }

    #[test]
    fn summary_counts_records() {
        let db = Database::open_in_memory();
        add_person(&db, "Ann");
        add_person(&db, "Bob");
        let summary = db.summary();
        assert_eq!(summary.counts[&EntityKind::Person], 2);
        assert_eq!(summary.counts[&EntityKind::Note], 0);
        assert_eq!(summary.surnames, 1);
        assert_eq!(summary.undo_len, 2);
        assert_eq!(summary.path, None);
        assert_eq!(db.surnames(), vec!["Smith"]);
    }

    #[test]
    fn suppressed_signals_are_not_delivered() {
        let db = Database::open_in_memory();
        let log = record_signals(&db);
        {
            let _quiet = db.suppress_signals();
            add_person(&db, "Ann");
        }
        assert!(log.lock().is_empty());
        db.disable_signals();
        add_person(&db, "Bob");
        db.enable_signals();
        assert!(log.lock().is_empty());
        add_person(&db, "Cid");
        assert_eq!(log.lock().len(), 3);
    }

    #[test]
    fn listener_commit_leaves_labels_at_final_history() {
        let db = Arc::new(Database::open_in_memory());
        let labels = Arc::new(Mutex::new(Vec::new()));
        {
            let labels = Arc::clone(&labels);
            db.connect(DbSignalKind::UndoAvailable, move |s| {
                if let DbSignal::UndoAvailable(label) = s {
                    labels.lock().push(label.clone());
                }
            })
            .unwrap();
        }
        let weak = Arc::downgrade(&db);
        db.connect(DbSignalKind::Added, move |s| {
            let Some(db) = weak.upgrade() else { return };
            if s.entity_kind() == Some(EntityKind::Person) {
                db.with_transaction("follow-up", false, |db, txn| {
                    db.add_event(Event::new(EventType::Birth), txn)
                })
                .unwrap();
            }
        })
        .unwrap();

        add_person(&db, "Ann");
        assert_eq!(db.undo_label().as_deref(), Some("follow-up"));
        assert_eq!(labels.lock().last().cloned().flatten().as_deref(), Some("follow-up"));
    }

    #[test]
    fn home_person_is_set_signalled_and_cleared() {
        let db = Database::open_in_memory();
        let changes = Arc::new(AtomicU64::new(0));
        {
            let changes = Arc::clone(&changes);
            db.connect(DbSignalKind::HomePersonChanged, move |_| {
                changes.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        assert_eq!(db.default_person(), None);

        let ann = add_person(&db, "Ann");
        db.set_default_person_handle(Some(ann)).unwrap();
        db.set_default_person_handle(Some(ann)).unwrap();
        assert_eq!(db.default_handle(), Some(ann));
        assert_eq!(db.default_person().unwrap().primary_name.first_name, "Ann");
        assert_eq!(db.summary().default_person, Some(ann));
        assert_eq!(changes.load(Ordering::SeqCst), 1);

        let err = db.set_default_person_handle(Some(Handle::new())).unwrap_err();
        assert!(err.is_not_found());

        db.with_transaction("remove", false, |db, txn| db.remove_person(ann, txn))
            .unwrap();
        assert_eq!(db.default_handle(), None);
        db.undo().unwrap();
        assert_eq!(db.default_handle(), Some(ann));

        db.set_default_person_handle(None).unwrap();
        assert_eq!(db.default_person(), None);
        assert_eq!(changes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn bookmarks_keep_order_and_skip_removed_records() {
        let db = Database::open_in_memory();
        let ann = add_person(&db, "Ann");
        let bob = add_person(&db, "Bob");
        db.set_bookmarks(EntityKind::Person, vec![bob, ann, bob]).unwrap();
        assert_eq!(db.bookmarks(EntityKind::Person), vec![bob, ann]);
        assert!(db.bookmarks(EntityKind::Family).is_empty());

        let err = db.set_bookmarks(EntityKind::Family, vec![ann]).unwrap_err();
        assert!(err.is_not_found());

        db.with_transaction("remove", false, |db, txn| db.remove_person(bob, txn))
            .unwrap();
        assert_eq!(db.bookmarks(EntityKind::Person), vec![ann]);
    }

    #[test]
    fn home_person_and_bookmarks_survive_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tree");
        let ann = {
            let db = Database::open(&path).unwrap();
            let ann = add_person(&db, "Ann");
            db.set_default_person_handle(Some(ann)).unwrap();
            db.set_bookmarks(EntityKind::Person, vec![ann]).unwrap();
            db.close().unwrap();
            ann
        };
        let db = Database::open(&path).unwrap();
        assert_eq!(db.default_handle(), Some(ann));
        assert_eq!(db.bookmarks(EntityKind::Person), vec![ann]);
    }

    #[test]
    fn save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree");
        let h = {
            let db = Database::open(&path).unwrap();
            let h = add_person(&db, "Ann");
            db.close().unwrap();
            h
        };

        let db = Database::open(&path).unwrap();
        assert_eq!(db.path(), Some(path.as_path()));
        assert_eq!(db.get_person_from_id("I0000").unwrap().handle, Some(h));
        assert_eq!(db.find_next_id(EntityKind::Person), "I0001");
        assert_eq!(db.undo_label().as_deref(), Some("add person"));
        db.undo().unwrap();
        assert!(db.get_person_from_handle(h).is_err());
    }

    #[test]
    fn transaction_ids_continue_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = Database::open(dir.path()).unwrap();
            add_person(&db, "Ann");
            db.close().unwrap();
        }
        let db = Database::open(dir.path()).unwrap();
        let txn = db.transaction_begin(false).unwrap();
        assert!(txn.id().as_u64() > db.history()[0].id.as_u64());
    }

    #[test]
    fn open_directory_is_locked() {
        let dir = tempfile::tempdir().unwrap();
        let _db = Database::open(dir.path()).unwrap();
        assert!(matches!(
            Database::open(dir.path()).unwrap_err(),
            CoreError::DatabaseLocked
        ));
    }

    #[test]
    fn read_only_open_needs_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        assert!(Database::open_with_config(&path, Config::new().read_only(true)).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn read_only_open_rejects_old_schema() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = Database::open(dir.path()).unwrap();
            db.close().unwrap();
        }
        {
            let store = DatabaseDir::open(dir.path(), false).unwrap();
            let mut metadata = Metadata::load(&store.metadata_backend().unwrap())
                .unwrap()
                .unwrap();
            metadata.schema_version = 1;
            metadata.store(&mut store.metadata_backend().unwrap()).unwrap();
        }
        let err = Database::open_with_config(dir.path(), Config::new().read_only(true)).unwrap_err();
        assert!(matches!(err, CoreError::SchemaMismatch { found: 1, .. }));

        let db = Database::open(dir.path()).unwrap();
        assert_eq!(db.summary().schema_version, SCHEMA_VERSION);
    }
}
