//! In-memory record store
//!
//! Records are keyed by identifier behind a reader-writer lock: a single
//! writer at a time, any number of concurrent readers. Queries take a
//! snapshot under the read guard and aggregate outside of it.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use crate::models::UserRecord;

type RecordMap = HashMap<Uuid, UserRecord>;

/// Shared handle to the record collection
#[derive(Clone, Default)]
pub struct RecordStore {
    records: Arc<RwLock<RecordMap>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record. Returns true if a record with the same id was replaced.
    pub async fn put(&self, record: UserRecord) -> bool {
        self.records.write().await.insert(record.id, record).is_some()
    }

    /// Clone every current record, ordered by identifier
    pub async fn snapshot(&self) -> Vec<UserRecord> {
        let records = self.records.read().await;
        let mut all: Vec<UserRecord> = records.values().cloned().collect();
        drop(records);
        all.sort_by_key(|r| r.id);
        all
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Acquire exclusive write access for a batch of puts.
    ///
    /// The writer owns its guard, so it can be moved onto a blocking thread.
    pub async fn writer(&self) -> StoreWriter {
        StoreWriter {
            guard: Arc::clone(&self.records).write_owned().await,
        }
    }
}

/// Write guard held for the duration of one ingestion
pub struct StoreWriter {
    guard: OwnedRwLockWriteGuard<RecordMap>,
}

impl StoreWriter {
    pub fn put(&mut self, record: UserRecord) -> bool {
        self.guard.insert(record.id, record).is_some()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}
