//! [`PredictionBoundary`] and its HTTP implementation.
//!
//! Clients never talk to the upstream provider directly; they go through
//! the boundary service, which holds the secret. [`HttpBoundary`] speaks the
//! boundary's REST contract:
//!
//! - `POST {base}/predictions` with `{modelId, parameters}`
//! - `GET {base}/predictions/{id}`
//! - `POST {base}/predictions/{id}/cancel`
//!
//! Error bodies look like `{"error": "...", "statusCode": 502}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ParameterValues;
use crate::{ReelgateError, Result};

/// Server-side proxy between clients and the upstream provider.
///
/// Responses are returned as raw JSON; callers parse them with
/// [`Prediction::from_value`](crate::types::Prediction::from_value).
#[async_trait]
pub trait PredictionBoundary: Send + Sync {
    /// Create a prediction for `model_id` (`owner/name`).
    async fn create_prediction(&self, model_id: &str, parameters: &ParameterValues)
    -> Result<Value>;

    /// Fetch the current state of a prediction.
    async fn get_prediction(&self, id: &str) -> Result<Value>;

    /// Request cancellation of a prediction.
    async fn cancel_prediction(&self, id: &str) -> Result<()>;
}

/// [`PredictionBoundary`] reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBoundary {
    http: Client,
    base_url: String,
}

impl HttpBoundary {
    /// Create a boundary client for a base URL such as `http://127.0.0.1:9750`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(60))
    }

    /// Create a boundary client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(crate::version::user_agent())
            .build()
            .map_err(|e| ReelgateError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ReelgateError::Http(e.to_string()))?;
        check_status(response).await
    }
}

#[async_trait]
impl PredictionBoundary for HttpBoundary {
    async fn create_prediction(
        &self,
        model_id: &str,
        parameters: &ParameterValues,
    ) -> Result<Value> {
        let url = format!("{}/predictions", self.base_url);
        let body = CreateRequest {
            model_id,
            parameters,
        };
        let response = self.send(self.http.post(&url).json(&body)).await?;
        response
            .json()
            .await
            .map_err(|_| ReelgateError::InvalidResponse)
    }

    async fn get_prediction(&self, id: &str) -> Result<Value> {
        let url = format!("{}/predictions/{}", self.base_url, id);
        let response = self.send(self.http.get(&url)).await?;
        response
            .json()
            .await
            .map_err(|_| ReelgateError::InvalidResponse)
    }

    async fn cancel_prediction(&self, id: &str) -> Result<()> {
        let url = format!("{}/predictions/{}/cancel", self.base_url, id);
        self.send(self.http.post(&url)).await?;
        Ok(())
    }
}

/// Map a non-success response to [`ReelgateError::Api`], keeping the status.
///
/// The message is the body's `error` field when present, otherwise
/// `"HTTP {code}: {reason}"`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )
        });

    Err(ReelgateError::Api {
        status: status.as_u16(),
        message,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    model_id: &'a str,
    parameters: &'a ParameterValues,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}
