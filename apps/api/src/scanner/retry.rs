//! Bounded retry for late-rendering forms.
//!
//! A scan that finds nothing is re-run a fixed number of times with a fixed
//! delay. This tolerates client-rendered pages that mount their forms after
//! load; it is not a transient-error policy and nothing else in the engine retries.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Re-scans after the first attempt.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Runs `attempt` until it yields a non-empty result or the policy is exhausted.
pub async fn scan_with_retry<T, F, Fut>(policy: RetryPolicy, mut attempt: F) -> Vec<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Vec<T>>,
{
    let found = attempt().await;
    if !found.is_empty() {
        return found;
    }

    for retry in 1..=policy.max_retries {
        tokio::time::sleep(policy.delay).await;
        let found = attempt().await;
        if !found.is_empty() {
            debug!("Scan found {} fields on retry {retry}", found.len());
            return found;
        }
    }

    debug!(
        "Scan still empty after {} retries",
        policy.max_retries
    );
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_returns_immediately_when_first_scan_finds_fields() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let start = tokio::time::Instant::now();
        let found = scan_with_retry(RetryPolicy::default(), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            vec!["field"]
        })
        .await;

        assert_eq!(found, vec!["field"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_picks_up_late_rendered_form() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let start = tokio::time::Instant::now();
        let found = scan_with_retry(RetryPolicy::default(), move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                vec![]
            } else {
                vec![n]
            }
        })
        .await;

        assert_eq!(found, vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy {
            max_retries: 2,
            delay: Duration::from_millis(100),
        };
        let found: Vec<u32> = scan_with_retry(policy, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![]
        })
        .await;

        assert!(found.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
