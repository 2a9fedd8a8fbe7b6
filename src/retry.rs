// src/retry.rs

//! Retry configuration and exponential backoff.
//!
//! The client never retries on its own. Callers that want to re-issue a
//! call after a timeout wrap it in [`retry_with_backoff`]:
//!
//! ```no_run
//! # use connect_client::{ConnectClient, RetryConfig, retry_with_backoff};
//! # async fn example(client: ConnectClient) -> connect_client::Result<()> {
//! let retry = RetryConfig::default();
//! let connectors = retry_with_backoff(Some(&retry), || client.list_connectors()).await?;
//! # let _ = connectors;
//! # Ok(())
//! # }
//! ```
//!
//! # Retry Strategy
//!
//! - Only [`ConnectError::Timeout`] is retried; service rejections, encode
//!   and decode failures and transport failures are returned immediately
//! - Exponential backoff with ±25% jitter
//! - Delay capped at `max_delay`

use std::collections::hash_map::RandomState;
use std::future::Future;
use std::hash::BuildHasher;
use std::time::Duration;

use tokio::time::sleep;

use crate::macros::log_debug;
use crate::Result;

/// Retry configuration with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (0 = just the initial attempt).
    pub max_attempts: u32,

    /// Factor applied to the delay after each retry.
    pub multiplier: f32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    /// 3 retries, doubling from 100ms, capped at 5s.
    fn default() -> Self {
        // ---
        Self {
            max_attempts: 3,
            multiplier: 2.0,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Run `operation`, re-running it after a backoff delay while it times out.
///
/// With `retry_config == None` the operation runs exactly once. Once the
/// retries are exhausted the last `Timeout` is returned.
pub async fn retry_with_backoff<F, Fut, T>(
    retry_config: Option<&RetryConfig>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let Some(retry_config) = retry_config else {
        return operation().await;
    };

    let mut attempt = 0;
    let mut current_delay = retry_config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) if err.is_retryable() => {
                attempt += 1;

                if attempt > retry_config.max_attempts {
                    log_debug!(
                        "retry exhausted after {} attempts, last error: {err}",
                        retry_config.max_attempts
                    );
                    return Err(err);
                }

                let jittered_delay = apply_jitter(current_delay);

                log_debug!(
                    "retry attempt {attempt}/{}, waiting {jittered_delay:?} ({err})",
                    retry_config.max_attempts
                );

                sleep(jittered_delay).await;

                let next_delay = Duration::from_secs_f64(
                    current_delay.as_secs_f64() * retry_config.multiplier as f64,
                );
                current_delay = next_delay.min(retry_config.max_delay);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Scale `delay` by a random factor in `0.75..=1.25`.
fn apply_jitter(delay: Duration) -> Duration {
    // ---
    let hash = RandomState::new().hash_one(std::time::SystemTime::now());
    let random_factor = (hash % 1000) as f64 / 1000.0;
    let jitter_multiplier = 0.75 + (random_factor * 0.5);

    Duration::from_secs_f64(delay.as_secs_f64() * jitter_multiplier)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::ConnectError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            multiplier: 2.0,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn test_no_retry_on_success() {
        // ---
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_with_backoff(Some(&RetryConfig::default()), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_config_executes_once() {
        // ---
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_with_backoff(None, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(ConnectError::Timeout)
            }
        })
        .await;

        assert!(matches!(result, Err(ConnectError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retried_until_success() {
        // ---
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_with_backoff(Some(&fast()), || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ConnectError::Timeout)
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_returns_timeout() {
        // ---
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig {
            max_attempts: 2,
            ..fast()
        };

        let result = retry_with_backoff(Some(&config), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ConnectError::Timeout)
            }
        })
        .await;

        assert!(matches!(result, Err(ConnectError::Timeout)));
        // Initial attempt + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_service_error_is_not_retried() {
        // ---
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_with_backoff(Some(&fast()), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ConnectError::service("rejected", Some("400")))
            }
        })
        .await;

        assert!(matches!(
            result,
            Err(ConnectError::Service { code: 400, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        // ---
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_with_backoff(Some(&fast()), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ConnectError::Transport("closed".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(ConnectError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_capped() {
        // ---
        let config = RetryConfig {
            max_attempts: 5,
            multiplier: 10.0,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        };
        let start = Instant::now();

        let fail = || async { Err::<(), _>(ConnectError::Timeout) };
        let _ = retry_with_backoff(Some(&config), fail).await;

        // 10ms, then four delays capped at 50ms, each within ±25%.
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(150),
            "elapsed too short: {elapsed:?}",
        );
        assert!(
            elapsed <= Duration::from_millis(300),
            "max_delay cap not working: {elapsed:?}",
        );
    }

    #[test]
    fn test_jitter_range() {
        // ---
        let delay = Duration::from_millis(100);

        for _ in 0..100 {
            let jittered = apply_jitter(delay);
            assert!(
                jittered >= Duration::from_millis(75),
                "jitter too low: {jittered:?}",
            );
            assert!(
                jittered <= Duration::from_millis(125),
                "jitter too high: {jittered:?}",
            );
        }
    }
}
