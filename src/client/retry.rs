//! Exponential backoff for connectivity failures
//!
//! Only failures where no HTTP response arrived are retried. Any response,
//! error status or not, ends the retry loop immediately.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::ApiError;

/// Retry policy for a single logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub max_retries: u32,
    /// Delay before the second attempt; doubles for each one after
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// No retries at all
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before attempt `attempt` (1-based): zero for the first, then
    /// `base × 2^(attempt-2)`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds, fails without a connectivity error,
    /// or the attempt budget is spent. The last error is returned.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Err(ApiError::Connectivity(msg)) if attempt < self.max_attempts() => {
                    let delay = self.delay_before(attempt + 1);
                    log::warn!(
                        "Connectivity failure (attempt {}/{}): {}; retrying in {:?}",
                        attempt,
                        self.max_attempts(),
                        msg,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
