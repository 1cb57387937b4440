//! Single-file JSON record store.
//!
//! # Responsibilities
//! - Keep all channels in one JSON object keyed by channel id
//! - Serialize every read-modify-write of the file
//!
//! # Design Decisions
//! - A missing or blank file reads as an empty store
//! - A corrupt file is an error; it is never overwritten with `{}`
//! - Entries are decoded one key at a time, so a malformed record only
//!   affects its own channel and is written back untouched
//! - Writes go to a sibling temp file and are renamed into place

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{CasOutcome, RecordStore, StoreError};
use crate::channel::ChannelRecord;

type Document = BTreeMap<String, Value>;

/// Record store backed by a single JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    async fn read_document(&self) -> Result<Document, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Document::new());
        }

        serde_json::from_str(&raw).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "Record file is corrupt");
            StoreError::from(e)
        })
    }

    async fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let serialized = serde_json::to_string_pretty(document)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, serialized).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(
            path = %self.path.display(),
            channels = document.len(),
            "Record file written"
        );
        Ok(())
    }

    fn decode(&self, key: &str, entry: Value) -> Result<ChannelRecord, StoreError> {
        serde_json::from_value(entry).map_err(|e| {
            tracing::error!(
                path = %self.path.display(),
                channel_id = %key,
                error = %e,
                "Stored record is malformed"
            );
            StoreError::from(e)
        })
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<ChannelRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        document
            .remove(key)
            .map(|entry| self.decode(key, entry))
            .transpose()
    }

    async fn put(&self, key: &str, record: ChannelRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(key.to_string(), serde_json::to_value(record)?);
        self.write_document(&document).await
    }

    async fn insert_if_absent(
        &self,
        key: &str,
        record: ChannelRecord,
    ) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        if document.contains_key(key) {
            return Ok(false);
        }
        document.insert(key.to_string(), serde_json::to_value(record)?);
        self.write_document(&document).await?;
        Ok(true)
    }

    async fn replace_if(
        &self,
        key: &str,
        expected_password: &str,
        record: ChannelRecord,
    ) -> Result<CasOutcome, StoreError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        let Some(entry) = document.get(key).cloned() else {
            return Ok(CasOutcome::Missing);
        };
        if self.decode(key, entry)?.password != expected_password {
            return Ok(CasOutcome::Mismatch);
        }
        document.insert(key.to_string(), serde_json::to_value(record)?);
        self.write_document(&document).await?;
        Ok(CasOutcome::Replaced)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
