//! Upstream provider trait.
//!
//! The boundary talks to the upstream video provider only through
//! [`PredictionProvider`]. This keeps the HTTP client swappable and lets
//! decorators like [`RetryingPredictionProvider`](super::RetryingPredictionProvider)
//! wrap any implementation.
//!
//! # Error contract
//!
//! - `AuthenticationFailed` for a rejected credential
//! - `ModelNotFound` / `PredictionNotFound` for unknown ids
//! - `RateLimited` for upstream throttling
//! - `Api { status, .. }` for any other non-success status; 502/503/504
//!   are transient and retried by the decorator

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::types::ParameterValues;

/// Provider of remote video predictions.
#[async_trait]
pub trait PredictionProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Resolve the latest version id of `model_id` (`owner/name`).
    async fn latest_version(&self, model_id: &str) -> Result<String>;

    /// Create a prediction for a resolved model version.
    ///
    /// Returns the provider's raw prediction JSON.
    async fn create_prediction(&self, version: &str, input: &ParameterValues) -> Result<Value>;

    /// Fetch the current state of a prediction.
    async fn get_prediction(&self, id: &str) -> Result<Value>;

    /// Request cancellation of a prediction.
    async fn cancel_prediction(&self, id: &str) -> Result<()>;
}
