//! Retry policies for embedding requests
//!
//! A policy decides, per failure, whether to try again and how long to wait.
//! Production runs use [`ExponentialBackoff`]; tests inject policies with
//! zero delays so retries run instantly.

use crate::error::{EmbeddingError, Result};
use codeeval_core::config::EmbeddingsConfig;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Decides whether a failed request is retried
pub trait RetryPolicy: Send + Sync {
    /// Delay before the next attempt, or `None` to give up
    ///
    /// `attempt` counts the failures so far, starting at 1.
    fn backoff(&self, attempt: u32, error: &EmbeddingError) -> Option<Duration>;
}

/// Bounded exponential backoff for transient errors
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    pub max_retries: u32,
    pub initial: Duration,
    pub max: Duration,
}

impl ExponentialBackoff {
    pub fn new(max_retries: u32, initial: Duration, max: Duration) -> Self {
        Self {
            max_retries,
            initial,
            max,
        }
    }

    pub fn from_config(config: &EmbeddingsConfig) -> Self {
        Self::new(
            u32::try_from(config.retry_attempts).unwrap_or(u32::MAX),
            Duration::from_millis(config.retry_initial_backoff_ms),
            Duration::from_millis(config.retry_max_backoff_ms),
        )
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn backoff(&self, attempt: u32, error: &EmbeddingError) -> Option<Duration> {
        if !error.is_transient() || attempt > self.max_retries {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        Some(self.initial.saturating_mul(factor).min(self.max))
    }
}

/// Never retries
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn backoff(&self, _attempt: u32, _error: &EmbeddingError) -> Option<Duration> {
        None
    }
}

/// Run `operation` until it succeeds or the policy gives up
pub async fn with_retry<T, F, Fut>(policy: &dyn RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                match policy.backoff(attempt, &e) {
                    Some(delay) => {
                        error!("Embedding generation failed: {e}");
                        warn!("Retrying in {delay:?} (attempt {attempt})");
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    None => return Err(e),
                }
            }
        }
    }
}
