//! Bounded retries with capped exponential backoff.
//!
//! # Backoff Strategy
//!
//! After failed attempt `n` (1-indexed) the executor sleeps for:
//! ```text
//! delay = min(base_delay * 2^n, max_delay)
//! ```
//! With the defaults (1s base, 15s cap, 3 attempts) that is 2s, then 4s,
//! then the last error is returned.
//!
//! [`RetryExecutor::execute`] retries every failure until the attempt cap.
//! [`RetryExecutor::execute_while`] lets the caller stop early on failures it
//! knows are final, which is how the extractors honour the classifier's
//! retryability verdict.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

use crate::config::RetryConfig;

pub struct RetryExecutor {
    /// Total attempts including the first one.
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryExecutor {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Sleep applied after failed attempt `attempt` (1-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `operation` until it succeeds or the attempt cap is reached.
    ///
    /// The closure receives the 1-indexed attempt number.
    pub async fn execute<T, E, F, Fut>(&self, label: &str, operation: F) -> Result<T, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.execute_while(label, operation, |_| true).await
    }

    /// Like [`execute`](Self::execute), but gives up as soon as `retry_if`
    /// returns `false` for an error.
    pub async fn execute_while<T, E, F, Fut, P>(
        &self,
        label: &str,
        mut operation: F,
        retry_if: P,
    ) -> Result<T, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: Fn(&E) -> bool,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let attempt_t0 = Instant::now();
            let e = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64;
            let elapsed_ms_total = total_t0.elapsed().as_millis() as u64;

            if attempt >= self.max_attempts {
                error!(
                    label,
                    attempt,
                    max = self.max_attempts,
                    elapsed_ms_attempt,
                    elapsed_ms_total,
                    error = %e,
                    "Exhausted retries"
                );
                return Err(e);
            }
            if !retry_if(&e) {
                warn!(label, attempt, error = %e, "Error is not retryable; giving up");
                return Err(e);
            }

            let delay = self.delay_for(attempt as u32);
            warn!(
                label,
                attempt,
                max = self.max_attempts,
                elapsed_ms_attempt,
                elapsed_ms_total,
                ?delay,
                error = %e,
                "Attempt failed; backing off"
            );
            sleep(delay).await;
        }
    }
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}
