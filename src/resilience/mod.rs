//! Resilience for record store calls.
//!
//! # Data Flow
//! ```text
//! Registry store call:
//!     → timeouts.rs (bounded deadline, expiry → StoreError::Timeout)
//!     → reads only: retries.rs (one retry on a transient error)
//!     → metrics (duration, retries)
//! ```
//!
//! # Design Decisions
//! - Every store call has a deadline, including in-process backends
//! - Writes are never retried: a timed-out write may have landed, and a
//!   replayed create or compare-and-swap would report the wrong outcome
//! - A corrupt document is not transient and is not retried

pub mod retries;
pub mod timeouts;

use std::time::Duration;

use crate::config::schema::StoreConfig;

pub use retries::{run_read, run_write};

/// Deadline and retry settings applied to every store call.
#[derive(Debug, Clone)]
pub struct StorePolicy {
    pub timeout: Duration,
    pub retry_enabled: bool,
    pub retry_base_delay: Duration,
}

impl StorePolicy {
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            retry_enabled: config.retry_enabled,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}
