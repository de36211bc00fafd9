//! redb-backed transactional store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | one per [`Collection`] | `id` | JSON entity | Current state |
//! | `change_log` | `sequence` | JSON `ChangeRecord` | Ordered change feed (append-only) |
//! | `sequence_counter` | `"seq"` | `u64` | Global sequence |
//!
//! # Transactions
//!
//! All mutation goes through [`Store::write`]. The closure gets a [`StoreTxn`]
//! spanning every collection; entity writes and their change records commit
//! atomically or not at all. After commit the change records are published to
//! the [`MessageBus`] while the store's publish lock is still held, so bus
//! order is always change-log order.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: once `commit()`
//! returns the data is on disk, and the file is always in a consistent state.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::Deserialize;
use shared::message::{ChangeAction, ChangeRecord, Collection};
use std::path::Path;
use std::sync::Arc;

use super::error::{StoreError, StoreResult};
use super::record::Record;
use crate::message::MessageBus;

/// Table for the change log: key = sequence, value = JSON-serialized ChangeRecord
const CHANGE_LOG_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("change_log");

/// Table for sequence counter: key = "seq", value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";

/// Entity table for a collection: key = id, value = JSON-serialized entity
fn entity_table(collection: Collection) -> TableDefinition<'static, &'static str, &'static [u8]> {
    TableDefinition::new(collection.as_str())
}

/// Only the version is needed for the optimistic check
#[derive(Deserialize)]
struct StoredVersion {
    #[serde(default)]
    version: u64,
}

/// Transactional store backed by redb
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
    bus: MessageBus,
    /// Held across begin → commit → publish
    publish_lock: Arc<Mutex<()>>,
}

impl Store {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>, bus: MessageBus) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db, bus)
    }

    /// Open an in-memory database (tests and demos)
    pub fn open_in_memory(bus: MessageBus) -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db, bus)
    }

    fn init(db: Database, bus: MessageBus) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            for collection in Collection::ALL {
                let _ = write_txn.open_table(entity_table(collection))?;
            }
            let _ = write_txn.open_table(CHANGE_LOG_TABLE)?;

            // Initialize sequence counter if not exists
            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            bus,
            publish_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Run `f` inside one write transaction.
    ///
    /// `Ok` commits every write made through the [`StoreTxn`] and then
    /// publishes the resulting change records in sequence order. `Err`
    /// aborts: nothing is written and nothing is published.
    pub fn write<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut StoreTxn) -> Result<R, E>,
        E: From<StoreError>,
    {
        let _guard = self.publish_lock.lock();
        let mut txn = self.begin()?;

        match f(&mut txn) {
            Ok(value) => {
                let changes = txn.commit()?;
                for change in changes {
                    self.bus.publish(change);
                }
                Ok(value)
            }
            Err(e) => {
                txn.abort();
                Err(e)
            }
        }
    }

    fn begin(&self) -> StoreResult<StoreTxn> {
        let txn = self.db.begin_write()?;
        let sequence = {
            let table = txn.open_table(SEQUENCE_TABLE)?;
            table.get(SEQUENCE_KEY)?.map(|guard| guard.value()).unwrap_or(0)
        };
        Ok(StoreTxn {
            txn,
            sequence,
            changes: Vec::new(),
            now: Utc::now(),
        })
    }

    // ========== Reads ==========

    pub fn get<T: Record>(&self, id: &str) -> StoreResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(entity_table(T::COLLECTION))?;
        table
            .get(id)?
            .map(|guard| serde_json::from_slice(guard.value()))
            .transpose()
            .map_err(StoreError::from)
    }

    pub fn require<T: Record>(&self, id: &str) -> StoreResult<T> {
        self.get(id)?.ok_or_else(|| StoreError::NotFound {
            collection: T::COLLECTION,
            id: id.to_string(),
        })
    }

    pub fn list<T: Record>(&self) -> StoreResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(entity_table(T::COLLECTION))?;

        let mut records = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            records.push(serde_json::from_slice(value.value())?);
        }
        Ok(records)
    }

    /// Get current sequence (read-only)
    pub fn current_sequence(&self) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Change records with `sequence > since`, oldest first, at most `limit`
    pub fn changes_since(&self, since: u64, limit: usize) -> StoreResult<Vec<ChangeRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHANGE_LOG_TABLE)?;

        let mut changes = Vec::new();
        for result in table.range(since.saturating_add(1)..)?.take(limit) {
            let (_key, value) = result?;
            changes.push(serde_json::from_slice(value.value())?);
        }
        Ok(changes)
    }
}

/// One open write transaction spanning all collections
pub struct StoreTxn {
    txn: WriteTransaction,
    /// Last sequence handed out in this transaction
    sequence: u64,
    changes: Vec<ChangeRecord>,
    now: DateTime<Utc>,
}

impl StoreTxn {
    /// Transaction timestamp, shared by every write in the transaction
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn get<T: Record>(&self, id: &str) -> StoreResult<Option<T>> {
        let table = self.txn.open_table(entity_table(T::COLLECTION))?;
        let value = table
            .get(id)?
            .map(|guard| serde_json::from_slice(guard.value()))
            .transpose()?;
        Ok(value)
    }

    pub fn require<T: Record>(&self, id: &str) -> StoreResult<T> {
        self.get(id)?.ok_or_else(|| StoreError::NotFound {
            collection: T::COLLECTION,
            id: id.to_string(),
        })
    }

    pub fn list<T: Record>(&self) -> StoreResult<Vec<T>> {
        let table = self.txn.open_table(entity_table(T::COLLECTION))?;

        let mut records = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            records.push(serde_json::from_slice(value.value())?);
        }
        Ok(records)
    }

    /// Insert a new record; its version becomes 1
    pub fn insert<T: Record>(&mut self, record: &mut T) -> StoreResult<()> {
        record.set_version(1);
        let bytes = serde_json::to_vec(record)?;
        {
            let mut table = self.txn.open_table(entity_table(T::COLLECTION))?;
            if table.get(record.id())?.is_some() {
                return Err(StoreError::AlreadyExists {
                    collection: T::COLLECTION,
                    id: record.id().to_string(),
                });
            }
            table.insert(record.id(), bytes.as_slice())?;
        }

        let data = record.change_data()?;
        self.append_change(T::COLLECTION, ChangeAction::Created, record.id(), 1, Some(data))
    }

    /// Write back a record read earlier.
    ///
    /// Fails with [`StoreError::VersionConflict`] when the stored version is
    /// not the one the caller read. On success the version is incremented.
    pub fn update<T: Record>(&mut self, record: &mut T) -> StoreResult<()> {
        let expected = record.version();
        {
            let mut table = self.txn.open_table(entity_table(T::COLLECTION))?;
            let actual = match table.get(record.id())? {
                Some(guard) => serde_json::from_slice::<StoredVersion>(guard.value())?.version,
                None => {
                    return Err(StoreError::NotFound {
                        collection: T::COLLECTION,
                        id: record.id().to_string(),
                    });
                }
            };
            if actual != expected {
                return Err(StoreError::VersionConflict {
                    collection: T::COLLECTION,
                    id: record.id().to_string(),
                    expected,
                    actual,
                });
            }

            record.set_version(expected + 1);
            let bytes = serde_json::to_vec(record)?;
            table.insert(record.id(), bytes.as_slice())?;
        }

        let data = record.change_data()?;
        self.append_change(
            T::COLLECTION,
            ChangeAction::Updated,
            record.id(),
            expected + 1,
            Some(data),
        )
    }

    /// Remove a record, returning what was stored
    pub fn delete<T: Record>(&mut self, id: &str) -> StoreResult<T> {
        let removed: T = {
            let mut table = self.txn.open_table(entity_table(T::COLLECTION))?;
            let removed = table.remove(id)?;
            match removed {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => {
                    return Err(StoreError::NotFound {
                        collection: T::COLLECTION,
                        id: id.to_string(),
                    });
                }
            }
        };

        self.append_change(T::COLLECTION, ChangeAction::Deleted, id, removed.version(), None)?;
        Ok(removed)
    }

    fn append_change(
        &mut self,
        collection: Collection,
        action: ChangeAction,
        id: &str,
        version: u64,
        data: Option<serde_json::Value>,
    ) -> StoreResult<()> {
        let record = ChangeRecord {
            sequence: self.sequence + 1,
            collection,
            action,
            id: id.to_string(),
            version,
            timestamp: self.now,
            data,
        };
        let bytes = serde_json::to_vec(&record)?;
        {
            let mut log = self.txn.open_table(CHANGE_LOG_TABLE)?;
            log.insert(record.sequence, bytes.as_slice())?;
        }

        self.sequence = record.sequence;
        self.changes.push(record);
        Ok(())
    }

    fn commit(self) -> StoreResult<Vec<ChangeRecord>> {
        {
            let mut table = self.txn.open_table(SEQUENCE_TABLE)?;
            table.insert(SEQUENCE_KEY, self.sequence)?;
        }
        self.txn.commit()?;
        Ok(self.changes)
    }

    fn abort(self) {
        if let Err(e) = self.txn.abort() {
            tracing::warn!(error = %e, "Failed to abort write transaction");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::TopicFilter;
    use shared::models::{DiningTable, TableStatus};

    fn create_test_table(id: &str, number: &str) -> DiningTable {
        let now = Utc::now();
        DiningTable {
            id: id.to_string(),
            version: 0,
            table_number: number.to_string(),
            capacity: 4,
            position: "Window".to_string(),
            location_id: "loc-1".to_string(),
            location_name: "Downtown".to_string(),
            status: TableStatus::Free,
            current_booking_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn store() -> Store {
        Store::open_in_memory(MessageBus::new()).unwrap()
    }

    #[test]
    fn test_insert_sets_version_and_logs_change() {
        let store = store();
        assert_eq!(store.current_sequence().unwrap(), 0);

        let table = store
            .write(|txn| {
                let mut table = create_test_table("t-1", "T1");
                txn.insert(&mut table)?;
                Ok::<_, StoreError>(table)
            })
            .unwrap();

        assert_eq!(table.version, 1);
        assert_eq!(store.current_sequence().unwrap(), 1);

        let loaded: DiningTable = store.require("t-1").unwrap();
        assert_eq!(loaded.table_number, "T1");

        let changes = store.changes_since(0, 100).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].collection, Collection::Tables);
        assert_eq!(changes[0].action, ChangeAction::Created);
        assert_eq!(changes[0].version, 1);
    }

    #[test]
    fn test_insert_duplicate_id_fails() {
        let store = store();
        store
            .write(|txn| txn.insert(&mut create_test_table("t-1", "T1")))
            .unwrap();

        let result = store.write(|txn| txn.insert(&mut create_test_table("t-1", "T1b")));
        assert!(matches!(result, Err(StoreError::AlreadyExists { .. })));
    }

    #[test]
    fn test_stale_update_is_rejected() {
        let store = store();
        store
            .write(|txn| txn.insert(&mut create_test_table("t-1", "T1")))
            .unwrap();

        let mut first: DiningTable = store.require("t-1").unwrap();
        let mut second: DiningTable = store.require("t-1").unwrap();

        first.status = TableStatus::Booked;
        store.write(|txn| txn.update(&mut first)).unwrap();
        assert_eq!(first.version, 2);

        second.status = TableStatus::Occupied;
        let result = store.write(|txn| txn.update(&mut second));
        match result {
            Err(StoreError::VersionConflict { expected, actual, .. }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("expected version conflict, got {:?}", other.map(|_| ())),
        }

        let stored: DiningTable = store.require("t-1").unwrap();
        assert_eq!(stored.status, TableStatus::Booked);
    }

    #[test]
    fn test_failed_closure_writes_nothing() {
        let store = store();
        store
            .write(|txn| txn.insert(&mut create_test_table("t-1", "T1")))
            .unwrap();

        let result: Result<(), StoreError> = store.write(|txn| {
            txn.insert(&mut create_test_table("t-2", "T2"))?;
            let mut table: DiningTable = txn.require("t-1")?;
            table.status = TableStatus::Booked;
            txn.update(&mut table)?;
            // Fails after two successful writes
            txn.require::<DiningTable>("missing")?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        assert!(store.get::<DiningTable>("t-2").unwrap().is_none());
        let t1: DiningTable = store.require("t-1").unwrap();
        assert_eq!(t1.status, TableStatus::Free);
        assert_eq!(t1.version, 1);
        assert_eq!(store.current_sequence().unwrap(), 1);
        assert_eq!(store.changes_since(0, 100).unwrap().len(), 1);
    }

    #[test]
    fn test_sequence_is_gap_free_across_transactions() {
        let store = store();
        for i in 0..5 {
            store
                .write(|txn| {
                    txn.insert(&mut create_test_table(&format!("t-{i}"), &format!("T{i}")))?;
                    let mut table: DiningTable = txn.require(&format!("t-{i}"))?;
                    table.capacity = 6;
                    txn.update(&mut table)
                })
                .unwrap();
        }

        let changes = store.changes_since(0, 100).unwrap();
        let sequences: Vec<u64> = changes.iter().map(|c| c.sequence).collect();
        assert_eq!(sequences, (1..=10).collect::<Vec<_>>());

        let tail = store.changes_since(7, 2).unwrap();
        assert_eq!(tail.iter().map(|c| c.sequence).collect::<Vec<_>>(), vec![8, 9]);
    }

    #[test]
    fn test_delete_returns_record() {
        let store = store();
        store
            .write(|txn| txn.insert(&mut create_test_table("t-1", "T1")))
            .unwrap();

        let removed: DiningTable = store.write(|txn| txn.delete("t-1")).unwrap();
        assert_eq!(removed.table_number, "T1");
        assert!(store.get::<DiningTable>("t-1").unwrap().is_none());

        let last = store.changes_since(1, 10).unwrap();
        assert_eq!(last[0].action, ChangeAction::Deleted);
        assert!(last[0].data.is_none());
    }

    #[tokio::test]
    async fn test_bus_order_matches_log_order() {
        let store = store();
        let mut sub = store.bus().subscribe(TopicFilter::all());

        store
            .write(|txn| {
                txn.insert(&mut create_test_table("t-1", "T1"))?;
                txn.insert(&mut create_test_table("t-2", "T2"))
            })
            .unwrap();
        store
            .write(|txn| txn.insert(&mut create_test_table("t-3", "T3")))
            .unwrap();

        let mut received = Vec::new();
        for _ in 0..3 {
            received.push(sub.recv().await.unwrap().sequence);
        }
        let logged: Vec<u64> = store
            .changes_since(0, 100)
            .unwrap()
            .iter()
            .map(|c| c.sequence)
            .collect();
        assert_eq!(received, logged);
    }

    #[test]
    fn test_reopen_keeps_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cafe.redb");

        {
            let store = Store::open(&path, MessageBus::new()).unwrap();
            store
                .write(|txn| txn.insert(&mut create_test_table("t-1", "T1")))
                .unwrap();
        }

        let store = Store::open(&path, MessageBus::new()).unwrap();
        assert_eq!(store.current_sequence().unwrap(), 1);
        store
            .write(|txn| txn.insert(&mut create_test_table("t-2", "T2")))
            .unwrap();
        assert_eq!(store.current_sequence().unwrap(), 2);
    }
}
