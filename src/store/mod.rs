//! Record store abstraction.
//!
//! # Data Flow
//! ```text
//! ChannelRegistry
//!     → resilience (timeout, read retry)
//!     → Arc<dyn RecordStore>
//!         → memory.rs (DashMap, per-key atomic entry API)
//!         → file.rs (single JSON document, serialized read-modify-write)
//! ```
//!
//! # Design Decisions
//! - Create and update go through atomic primitives (`insert_if_absent`,
//!   `replace_if`), never a separate get followed by put
//! - Every backend error is a `StoreError`; absence is `Ok(None)`
//! - The store is injected, never a module-level singleton

pub mod file;
pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::channel::ChannelRecord;
use crate::config::schema::{StoreBackend, StoreConfig};

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Errors raised by record store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }
}

/// Outcome of [`RecordStore::replace_if`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The record was replaced.
    Replaced,
    /// No record exists under the key.
    Missing,
    /// A record exists but its password changed since it was read.
    Mismatch,
}

/// Durable mapping from channel id to channel record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record. `Ok(None)` when absent.
    async fn get(&self, key: &str) -> Result<Option<ChannelRecord>, StoreError>;

    /// Unconditional write.
    async fn put(&self, key: &str, record: ChannelRecord) -> Result<(), StoreError>;

    /// Atomically write `record` only if `key` is absent.
    ///
    /// Returns `false` when a record already exists.
    async fn insert_if_absent(&self, key: &str, record: ChannelRecord)
        -> Result<bool, StoreError>;

    /// Atomically replace the record under `key` if its stored password is
    /// still exactly `expected_password`.
    async fn replace_if(
        &self,
        key: &str,
        expected_password: &str,
        record: ChannelRecord,
    ) -> Result<CasOutcome, StoreError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Build the configured backend.
pub fn from_config(config: &StoreConfig) -> Arc<dyn RecordStore> {
    match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(JsonFileStore::new(&config.path)),
    }
}
