//! In-process prediction store

use super::{async_trait, LookupKey, PredictionRecord, PredictionStore, StoreError, StoreId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use tracing::debug;

/// Default number of predictions kept by a bounded memory store
pub const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

/// Records keyed by store id, with a unique index on `prediction_id`.
///
/// A bounded store evicts the smallest (oldest) store id once it holds more
/// than `capacity` records. Both lookups of an evicted record miss.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<StoreId, PredictionRecord>,
    by_prediction_id: DashMap<String, StoreId>,
    capacity: Option<usize>,
    /// Eviction order; only maintained when bounded
    ids: Mutex<BTreeSet<StoreId>>,
}

impl MemoryStore {
    /// Unbounded store, used as the file store's index
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that keeps at most `capacity` records (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index a record; shared by the file store when replaying its log
    pub(crate) fn insert_record(&self, record: PredictionRecord) -> Result<StoreId, StoreError> {
        let Some(capacity) = self.capacity else {
            return self.index(record);
        };

        // order lock spans insert and eviction so the maps never disagree
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        let id = self.index(record)?;
        ids.insert(id);

        while ids.len() > capacity {
            let Some(oldest) = ids.pop_first() else {
                break;
            };
            if let Some((_, evicted)) = self.records.remove(&oldest) {
                self.by_prediction_id.remove(&evicted.prediction_id);
                debug!(
                    store_id = %oldest,
                    prediction_id = %evicted.prediction_id,
                    "Evicted prediction"
                );
            }
        }

        Ok(id)
    }

    fn index(&self, record: PredictionRecord) -> Result<StoreId, StoreError> {
        let id = record.id;
        match self.by_prediction_id.entry(record.prediction_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(record.prediction_id)),
            Entry::Vacant(slot) => {
                if self.records.contains_key(&id) {
                    return Err(StoreError::Duplicate(record.prediction_id));
                }
                slot.insert(id);
                self.records.insert(id, record);
                Ok(id)
            }
        }
    }

    pub(crate) fn contains_prediction_id(&self, prediction_id: &str) -> bool {
        self.by_prediction_id.contains_key(prediction_id)
    }

    pub(crate) fn get(&self, key: &LookupKey) -> Option<PredictionRecord> {
        let id = match key {
            LookupKey::StoreId(id) => *id,
            LookupKey::PredictionId(pid) => *self.by_prediction_id.get(pid)?,
        };
        self.records.get(&id).map(|r| r.value().clone())
    }

    /// Newest `limit` records by `predicted_at`, ties broken by store id.
    /// Only the selected records are cloned.
    pub(crate) fn newest(&self, limit: usize) -> Vec<PredictionRecord> {
        let mut keys: Vec<_> = self
            .records
            .iter()
            .map(|r| (r.value().predicted_at, *r.key()))
            .collect();
        keys.sort_unstable_by(|a, b| b.cmp(a));
        keys.truncate(limit);

        keys.into_iter()
            .filter_map(|(_, id)| self.records.get(&id).map(|r| r.value().clone()))
            .collect()
    }
}

#[async_trait]
impl PredictionStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        debug!(capacity = ?self.capacity, "Memory store indexes prediction_id on insert");
        Ok(())
    }

    async fn insert(&self, record: PredictionRecord) -> Result<StoreId, StoreError> {
        self.insert_record(record)
    }

    async fn find(&self, key: &LookupKey) -> Result<Option<PredictionRecord>, StoreError> {
        Ok(self.get(key))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError> {
        Ok(self.newest(limit))
    }
}
