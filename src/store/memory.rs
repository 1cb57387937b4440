//! In-memory record store.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::{CasOutcome, RecordStore, StoreError};
use crate::channel::ChannelRecord;

/// A concurrent map of channel id -> record.
///
/// Cloning shares the same map. Used for tests and single-process
/// deployments that do not need durability.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<DashMap<String, ChannelRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored channels.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<ChannelRecord>, StoreError> {
        Ok(self.records.get(key).map(|r| r.value().clone()))
    }

    async fn put(&self, key: &str, record: ChannelRecord) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), record);
        Ok(())
    }

    async fn insert_if_absent(
        &self,
        key: &str,
        record: ChannelRecord,
    ) -> Result<bool, StoreError> {
        match self.records.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn replace_if(
        &self,
        key: &str,
        expected_password: &str,
        record: ChannelRecord,
    ) -> Result<CasOutcome, StoreError> {
        match self.records.get_mut(key) {
            None => Ok(CasOutcome::Missing),
            Some(mut current) if current.password == expected_password => {
                *current = record;
                Ok(CasOutcome::Replaced)
            }
            Some(_) => Ok(CasOutcome::Mismatch),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
