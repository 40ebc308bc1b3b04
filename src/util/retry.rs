//! Retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use crate::error::AgentError;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Execute an async operation with retry.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, AgentError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            if !err.is_retryable() || attempt >= max_attempts {
                return Err(err);
            }

            let delay = match &err {
                AgentError::RateLimited {
                    retry_after_ms: Some(ms),
                } => Duration::from_millis(*ms).min(self.max_backoff),
                _ => jittered(backoff),
            };

            tracing::warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying after error"
            );
            tokio::time::sleep(delay).await;

            backoff = Duration::from_secs_f64(
                (backoff.as_secs_f64() * self.multiplier).min(self.max_backoff.as_secs_f64()),
            );
        }
    }
}

/// Jitter: 75%-125% of backoff.
fn jittered(backoff: Duration) -> Duration {
    let factor = 0.75 + (rand_factor() * 0.5);
    Duration::from_secs_f64(backoff.as_secs_f64() * factor)
}

/// Pseudo-random factor in [0, 1) derived from the clock.
fn rand_factor() -> f64 {
    let nanos = chrono::Utc::now().timestamp_subsec_nanos();
    (nanos % 10_000) as f64 / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            multiplier: 1.0,
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(AgentError::api(503, "unavailable"))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy(5)
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AgentError::api(400, "bad request")) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy(2)
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AgentError::Timeout(5)) }
            })
            .await;
        assert!(matches!(result, Err(AgentError::Timeout(5))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
