//! Retry configuration, delay calculation, and the provider decorator.
//!
//! Provides [`RetryConfig`] for controlling retry behaviour and
//! [`RetryingPredictionProvider`], which wraps a [`PredictionProvider`]
//! with automatic retry on transient upstream errors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::telemetry;

use super::traits::PredictionProvider;
use crate::Result;
use crate::types::ParameterValues;

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff without jitter:
///
/// ```rust
/// # use reelgate::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(200));
/// assert_eq!(config.delay_for_attempt(2), Duration::from_millis(800));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the initial attempt. 0 = no retry. Default: 3.
    pub max_retries: u32,
    /// Delay before the first retry. Default: 1s.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set the number of retries after the initial attempt.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculate the delay after a failed attempt (0-indexed).
    ///
    /// Uses exponential backoff: `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }
}

// ============================================================================
// Shared retry helper
// ============================================================================

/// Execute an async operation with retry logic.
///
/// Retries on transient errors (as classified by
/// [`ReelgateError::is_transient()`](crate::ReelgateError::is_transient))
/// up to `config.max_retries` times with exponential backoff. Permanent
/// errors are returned immediately; once retries run out the last transient
/// error is returned unchanged.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    provider_name: &str,
    operation: &str,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                let delay = config.delay_for_attempt(attempt);
                metrics::counter!(telemetry::RETRIES_TOTAL,
                    "provider" => provider_name.to_owned(),
                    "operation" => operation.to_owned(),
                )
                .increment(1);
                warn!(
                    provider = provider_name,
                    operation,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "retrying after transient error"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

// ============================================================================
// RetryingPredictionProvider
// ============================================================================

/// Decorator that wraps a [`PredictionProvider`] with retry logic.
///
/// Only version resolution and prediction creation are retried. Status
/// fetches are already repeated by the poller and cancellation is
/// best-effort, so both pass straight through.
pub struct RetryingPredictionProvider {
    inner: Arc<dyn PredictionProvider>,
    config: RetryConfig,
}

impl RetryingPredictionProvider {
    /// Wrap a provider with retry logic.
    pub fn new(inner: Arc<dyn PredictionProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl PredictionProvider for RetryingPredictionProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn latest_version(&self, model_id: &str) -> Result<String> {
        with_retry(&self.config, self.inner.name(), "latest_version", || {
            self.inner.latest_version(model_id)
        })
        .await
    }

    async fn create_prediction(&self, version: &str, input: &ParameterValues) -> Result<Value> {
        with_retry(&self.config, self.inner.name(), "create_prediction", || {
            self.inner.create_prediction(version, input)
        })
        .await
    }

    async fn get_prediction(&self, id: &str) -> Result<Value> {
        self.inner.get_prediction(id).await
    }

    async fn cancel_prediction(&self, id: &str) -> Result<()> {
        self.inner.cancel_prediction(id).await
    }
}
