//! Deadline enforcement for store calls.

use std::future::Future;
use std::time::Duration;

use crate::store::StoreError;

/// Await `fut` for at most `limit`.
///
/// Expiry is reported as [`StoreError::Timeout`], distinct from every other
/// store failure and from an absent record.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
