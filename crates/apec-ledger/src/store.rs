//! # Record Store
//!
//! A key-value store with one write primitive: create a record at a vacant
//! key, or fail because the key is occupied. There is no update and no
//! delete. Every uniqueness rule in the program (one provider per id, one
//! course per id, one commitment per course, one claim per claimant) is
//! this primitive applied to a derived key.
//!
//! [`RecordStore::create_with`] runs its builder while the key is held
//! exclusively. Two callers racing on the same key see exactly one builder
//! run; callers on different keys proceed in parallel. If the builder fails,
//! nothing is written and the key stays vacant.
//!
//! [`MemoryStore`] holds a key through a per-key gate, never through a map
//! shard. A slow builder blocks only callers of the same key; loads and
//! creates elsewhere in the map are unaffected.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;

use apec_core::RecordKey;
use apec_state::Record;

/// Failure of [`RecordStore::create_with`].
#[derive(Debug)]
pub enum CreateError<E> {
    /// The key already holds a record. The builder was not run.
    Occupied(RecordKey),
    /// The builder failed. Nothing was written.
    Build(E),
}

/// A snapshot could not be restored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// A record was filed under a key other than its derived key.
    #[error("record filed under {found} derives key {expected}")]
    KeyMismatch {
        /// Key in the snapshot.
        found: RecordKey,
        /// Key derived from the record.
        expected: RecordKey,
    },
}

/// Storage seam for ledger records.
pub trait RecordStore: Send + Sync {
    /// Load the record at `key`.
    fn load(&self, key: &RecordKey) -> Option<Record>;

    /// Whether `key` is occupied.
    fn exists(&self, key: &RecordKey) -> bool {
        self.load(key).is_some()
    }

    /// Create the record at `key` if vacant.
    ///
    /// `build` runs at most once, only if the key is vacant, and while the
    /// key is held exclusively. It must not call back into the store.
    fn create_with<E, F>(&self, key: RecordKey, build: F) -> Result<Record, CreateError<E>>
    where
        F: FnOnce() -> Result<Record, E>;

    /// Number of stored records.
    fn len(&self) -> usize;

    /// Whether the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store sharded over a `DashMap`.
///
/// Cheaply cloneable; all clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<DashMap<RecordKey, Record>>,
    /// Gates for keys whose builder is running or has failed.
    gates: Arc<DashMap<RecordKey, Arc<Mutex<()>>>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out every record, ordered by key.
    pub fn snapshot(&self) -> BTreeMap<RecordKey, Record> {
        self.records
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Rebuild a store from a snapshot, checking each record sits at its
    /// derived key.
    pub fn from_snapshot(snapshot: BTreeMap<RecordKey, Record>) -> Result<Self, SnapshotError> {
        let records = DashMap::with_capacity(snapshot.len());
        for (found, record) in snapshot {
            let expected = record.key();
            if found != expected {
                return Err(SnapshotError::KeyMismatch { found, expected });
            }
            records.insert(found, record);
        }
        Ok(Self {
            records: Arc::new(records),
            gates: Arc::default(),
        })
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("records", &self.records.len())
            .finish()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self, key: &RecordKey) -> Option<Record> {
        self.records.get(key).map(|r| r.value().clone())
    }

    fn exists(&self, key: &RecordKey) -> bool {
        self.records.contains_key(key)
    }

    fn create_with<E, F>(&self, key: RecordKey, build: F) -> Result<Record, CreateError<E>>
    where
        F: FnOnce() -> Result<Record, E>,
    {
        if self.records.contains_key(&key) {
            return Err(CreateError::Occupied(key));
        }

        // Clone the gate out so the shard guard is released before waiting.
        let gate = Arc::clone(self.gates.entry(key).or_default().value());
        let _held = gate.lock();
        if self.records.contains_key(&key) {
            return Err(CreateError::Occupied(key));
        }

        let record = build().map_err(CreateError::Build)?;
        self.records.insert(key, record.clone());
        // Late waiters still hold a clone and will see the record on recheck.
        self.gates.remove(&key);
        Ok(record)
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
