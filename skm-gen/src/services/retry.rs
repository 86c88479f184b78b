//! Generator-level retry with linear backoff
//!
//! Wraps one prompt → complete → validate cycle. Distinct from the completion
//! client's 429 backoff: this loop re-samples the model when its output was
//! unusable, and waits `step * attempt` between attempts.

use std::future::Future;
use std::time::{Duration, Instant};

/// Attempt budget and backoff step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearRetry {
    pub max_attempts: u32,
    pub step: Duration,
}

impl LinearRetry {
    pub fn new(max_attempts: u32, step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            step,
        }
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt)
    }
}

impl Default for LinearRetry {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Final failure of a retried operation
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// Attempts actually made
    pub attempts: u32,
    pub last_error: E,
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt budget is spent
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "skill generation")
/// * `policy` - Attempt budget and linear backoff step
/// * `is_retryable` - Whether an error may be fixed by another attempt
/// * `operation` - Async closure receiving the 1-based attempt number
pub async fn retry_linear<F, Fut, T, E, R>(
    operation_name: &str,
    policy: LinearRetry,
    is_retryable: R,
    mut operation: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let start_time = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_retryable(&err) {
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        "Non-retryable failure: {}",
                        err
                    );
                    return Err(RetryFailure {
                        attempts: attempt,
                        last_error: err,
                    });
                }

                if attempt >= max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Retries exhausted: {}",
                        err
                    );
                    return Err(RetryFailure {
                        attempts: attempt,
                        last_error: err,
                    });
                }

                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Attempt failed, retrying: {}",
                    err
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
