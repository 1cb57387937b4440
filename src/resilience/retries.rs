//! Bounded retry for store reads.

use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};

use super::timeouts::with_timeout;
use super::StorePolicy;
use crate::observability::metrics;
use crate::store::StoreError;

/// Whether a failed store call may succeed when repeated.
pub fn is_retryable(err: &StoreError) -> bool {
    matches!(
        err,
        StoreError::Timeout(_) | StoreError::Io(_) | StoreError::Backend(_)
    )
}

/// Base delay plus up to 10% jitter.
fn retry_delay(base: Duration) -> Duration {
    let base_ms = base.as_millis() as u64;
    let jitter_range = base_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };
    Duration::from_millis(base_ms + jitter)
}

/// Run an idempotent store read under the policy deadline, retrying once on
/// a transient failure.
pub async fn run_read<T, F, Fut>(
    op: &'static str,
    policy: &StorePolicy,
    mut call: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let start = Instant::now();
    let result = match with_timeout(policy.timeout, call()).await {
        Err(e) if policy.retry_enabled && is_retryable(&e) => {
            let delay = retry_delay(policy.retry_base_delay);
            tracing::warn!(op, error = %e, delay = ?delay, "Retrying store read");
            metrics::record_store_retry(op);
            tokio::time::sleep(delay).await;
            with_timeout(policy.timeout, call()).await
        }
        other => other,
    };
    metrics::record_store_operation(op, start);
    result
}

/// Run a store write under the policy deadline. Never retried.
pub async fn run_write<T, Fut>(
    op: &'static str,
    policy: &StorePolicy,
    fut: Fut,
) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    let start = Instant::now();
    let result = with_timeout(policy.timeout, fut).await;
    metrics::record_store_operation(op, start);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(retry_enabled: bool) -> StorePolicy {
        StorePolicy {
            timeout: Duration::from_millis(100),
            retry_enabled,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_retry_delay_jitter_bounds() {
        for _ in 0..32 {
            let delay = retry_delay(Duration::from_millis(100));
            assert!(delay >= Duration::from_millis(100));
            assert!(delay < Duration::from_millis(110));
        }
        assert_eq!(retry_delay(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable(&StoreError::Timeout(Duration::from_secs(1))));
        assert!(is_retryable(&StoreError::Backend("down".into())));
        let corrupt = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!is_retryable(&StoreError::Serialization(corrupt)));
    }

    #[tokio::test]
    async fn test_read_retried_once() {
        let calls = AtomicU32::new(0);
        let result = run_read("get", &policy(true), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(StoreError::Backend("flaky".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_read_gives_up_after_one_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = run_read("get", &policy(true), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::Backend("down".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_disabled() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = run_read("get", &policy(false), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::Backend("down".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
