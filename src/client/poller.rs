//! Fixed-cadence status polling.

use std::sync::Arc;
use std::time::Duration;

use super::boundary::PredictionBoundary;
use crate::telemetry;
use crate::types::Prediction;
use crate::{ReelgateError, Result};

/// Polling cadence and budget.
///
/// ```rust
/// # use reelgate::PollConfig;
/// # use std::time::Duration;
/// let config = PollConfig::new()
///     .interval(Duration::from_millis(500))
///     .max_attempts(10);
/// assert_eq!(config.initial_delay, Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before the first fetch. Default: 2s.
    pub initial_delay: Duration,
    /// Wait between fetches. Default: 3s.
    pub interval: Duration,
    /// Maximum number of fetches. Default: 400 (about 20 minutes).
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            interval: Duration::from_secs(3),
            max_attempts: 400,
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }
}

/// Polls a prediction until it reaches a terminal status.
#[derive(Clone)]
pub struct StatusPoller {
    boundary: Arc<dyn PredictionBoundary>,
    config: PollConfig,
}

impl StatusPoller {
    pub fn new(boundary: Arc<dyn PredictionBoundary>, config: PollConfig) -> Self {
        Self { boundary, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `prediction_id` until terminal, calling `on_update` with every
    /// observation (terminal ones included), in order.
    ///
    /// Fails with [`ReelgateError::Polling`] on the first fetch error and
    /// with [`ReelgateError::PollingTimeout`] once the attempt budget is spent.
    pub async fn poll<F>(&self, prediction_id: &str, mut on_update: F) -> Result<Prediction>
    where
        F: FnMut(&Prediction),
    {
        tokio::time::sleep(self.config.initial_delay).await;

        for attempt in 0..self.config.max_attempts {
            let prediction = match self.fetch(prediction_id).await {
                Ok(p) => p,
                Err(e) => {
                    metrics::counter!(telemetry::POLLS_TOTAL, "status" => "error").increment(1);
                    return Err(ReelgateError::polling(e));
                }
            };
            metrics::counter!(telemetry::POLLS_TOTAL, "status" => "ok").increment(1);
            tracing::trace!(prediction = prediction_id, attempt, status = %prediction.status, "polled");

            on_update(&prediction);
            if prediction.is_terminal() {
                return Ok(prediction);
            }
            tokio::time::sleep(self.config.interval).await;
        }

        Err(ReelgateError::PollingTimeout {
            attempts: self.config.max_attempts,
        })
    }

    /// One status fetch, without waiting.
    pub async fn fetch(&self, prediction_id: &str) -> Result<Prediction> {
        let raw = self.boundary.get_prediction(prediction_id).await?;
        Prediction::from_value(raw)
    }
}
