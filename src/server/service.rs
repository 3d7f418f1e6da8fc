//! Boundary service: the server-side proxy to the upstream provider.
//!
//! [`ProxyService`] owns the (retry-wrapped) upstream provider, validates
//! incoming requests, resolves model versions and normalizes every
//! prediction it hands back. It is transport-agnostic: the axum router in
//! `routes` serves it over HTTP, and it also implements
//! [`PredictionBoundary`] for in-process use.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::client::PredictionBoundary;
use crate::providers::{PredictionProvider, RetryConfig, RetryingPredictionProvider};
use crate::telemetry;
use crate::types::{ParameterValues, Prediction};
use crate::{ReelgateError, Result};

/// Message returned when the upstream stays unavailable after retries.
pub const UPSTREAM_UNAVAILABLE_MESSAGE: &str =
    "Upstream provider is temporarily unavailable. Please try again shortly.";

/// A validated create request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePredictionRequest {
    pub model_id: String,
    pub parameters: ParameterValues,
}

impl CreatePredictionRequest {
    /// Validate an untrusted `{modelId, parameters}` body.
    pub fn from_json(body: &Value) -> Result<Self> {
        let model_id = body.get("modelId").and_then(Value::as_str).unwrap_or("");
        let parameters = body.get("parameters");
        if model_id.is_empty() || parameters.is_none_or(Value::is_null) {
            return Err(ReelgateError::InvalidRequest(
                "Missing modelId or parameters".to_string(),
            ));
        }

        match model_id.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {}
            _ => {
                return Err(ReelgateError::InvalidRequest(
                    "Invalid model ID format. Expected \"owner/model\"".to_string(),
                ));
            }
        }

        let Some(Value::Object(parameters)) = parameters else {
            return Err(ReelgateError::InvalidRequest(
                "parameters must be an object".to_string(),
            ));
        };
        if let Some((key, _)) = parameters.iter().find(|(_, v)| !is_parameter_value(v)) {
            return Err(ReelgateError::InvalidRequest(format!(
                "Invalid value for parameter '{key}'"
            )));
        }

        Ok(Self {
            model_id: model_id.to_string(),
            parameters: parameters.clone(),
        })
    }
}

/// Primitives, or arrays of primitives.
fn is_parameter_value(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().all(is_primitive),
        other => is_primitive(other),
    }
}

fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// HTTP status and client-facing message for a boundary error.
///
/// 401/404/429 map to themselves, 502/503/504 keep their status with a
/// generic message, other 4xx pass through, and everything else is a 500.
pub fn boundary_status(error: &ReelgateError) -> (u16, String) {
    let root = error.root_cause();
    match root {
        ReelgateError::InvalidRequest(message) => (400, message.clone()),
        ReelgateError::Validation(_) => (400, root.to_string()),
        ReelgateError::AuthenticationFailed => (401, "Invalid API key".to_string()),
        ReelgateError::ModelNotFound(_) | ReelgateError::PredictionNotFound(_) => {
            (404, root.to_string())
        }
        ReelgateError::RateLimited { .. } => (429, "Rate limit exceeded".to_string()),
        ReelgateError::Api { status, .. } if matches!(*status, 502..=504) => {
            (*status, UPSTREAM_UNAVAILABLE_MESSAGE.to_string())
        }
        ReelgateError::Api { status, message } if (400..500).contains(status) => {
            (*status, message.clone())
        }
        _ => (500, root.to_string()),
    }
}

/// Server-side proxy between clients and the upstream provider.
pub struct ProxyService {
    provider: Arc<dyn PredictionProvider>,
}

impl ProxyService {
    /// Wrap `provider` with retry on transient failures.
    pub fn new(provider: Arc<dyn PredictionProvider>, retry: RetryConfig) -> Self {
        Self {
            provider: Arc::new(RetryingPredictionProvider::new(provider, retry)),
        }
    }

    /// Use `provider` as-is, without a retry layer.
    pub fn without_retry(provider: Arc<dyn PredictionProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Create a prediction from an untrusted JSON request body.
    pub async fn create_from_json(&self, body: &Value) -> Result<Prediction> {
        let request = CreatePredictionRequest::from_json(body)?;
        self.create(&request).await
    }

    /// Resolve the model's latest version and create a prediction.
    pub async fn create(&self, request: &CreatePredictionRequest) -> Result<Prediction> {
        let start = Instant::now();
        let result = async {
            let version = self.provider.latest_version(&request.model_id).await?;
            let raw = self
                .provider
                .create_prediction(&version, &request.parameters)
                .await?;
            Prediction::from_value(raw)
        }
        .await;
        self.record_request("create_prediction", start, &result);
        if let Ok(prediction) = &result {
            tracing::info!(model = %request.model_id, prediction = %prediction.id, "prediction created");
        }
        result
    }

    /// Fetch a prediction by id.
    pub async fn get(&self, id: &str) -> Result<Prediction> {
        let id = require_id(id)?;
        let start = Instant::now();
        let result = async { Prediction::from_value(self.provider.get_prediction(id).await?) }.await;
        self.record_request("get_prediction", start, &result);
        result
    }

    /// Cancel a prediction by id.
    pub async fn cancel(&self, id: &str) -> Result<()> {
        let id = require_id(id)?;
        let start = Instant::now();
        let result = self.provider.cancel_prediction(id).await;
        self.record_request("cancel_prediction", start, &result);
        if result.is_ok() {
            tracing::info!(prediction = id, "prediction cancel requested");
        }
        result
    }

    /// Record request outcome metrics (counter + histogram).
    fn record_request<T>(&self, operation: &'static str, start: Instant, result: &Result<T>) {
        let status = if result.is_ok() { "ok" } else { "error" };
        let elapsed = start.elapsed().as_secs_f64();
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => self.provider.name().to_owned(),
            "operation" => operation,
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => self.provider.name().to_owned(),
            "operation" => operation,
        )
        .record(elapsed);

        if let Err(e) = result {
            let (code, _) = boundary_status(e);
            if code >= 500 {
                tracing::error!(operation, status = code, error = %e, "boundary request failed");
            } else {
                tracing::debug!(operation, status = code, error = %e, "boundary request rejected");
            }
        }
    }
}

fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ReelgateError::InvalidRequest(
            "Missing or invalid prediction ID".to_string(),
        ));
    }
    Ok(id)
}

/// Same semantics as the HTTP boundary: errors come back as
/// `Api { status, message }` after status mapping.
#[async_trait]
impl PredictionBoundary for ProxyService {
    async fn create_prediction(
        &self,
        model_id: &str,
        parameters: &ParameterValues,
    ) -> Result<Value> {
        let mut body = Map::new();
        body.insert("modelId".into(), Value::String(model_id.to_string()));
        body.insert("parameters".into(), Value::Object(parameters.clone()));
        let prediction = self
            .create_from_json(&Value::Object(body))
            .await
            .map_err(into_api_error)?;
        Ok(serde_json::to_value(prediction)?)
    }

    async fn get_prediction(&self, id: &str) -> Result<Value> {
        let prediction = self.get(id).await.map_err(into_api_error)?;
        Ok(serde_json::to_value(prediction)?)
    }

    async fn cancel_prediction(&self, id: &str) -> Result<()> {
        self.cancel(id).await.map_err(into_api_error)
    }
}

fn into_api_error(error: ReelgateError) -> ReelgateError {
    let (status, message) = boundary_status(&error);
    ReelgateError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_requires_model_and_parameters() {
        for body in [
            json!({"parameters": {}}),
            json!({"modelId": "", "parameters": {}}),
            json!({"modelId": "a/b"}),
            json!({"modelId": "a/b", "parameters": null}),
        ] {
            let err = CreatePredictionRequest::from_json(&body).unwrap_err();
            assert_eq!(err.to_string(), "invalid request: Missing modelId or parameters");
        }
    }

    #[test]
    fn request_model_id_needs_owner_and_name() {
        for id in ["veo-3", "/veo-3", "google/"] {
            let body = json!({"modelId": id, "parameters": {}});
            assert!(matches!(
                CreatePredictionRequest::from_json(&body),
                Err(ReelgateError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn request_parameters_must_be_primitive() {
        let ok = json!({"modelId": "a/b", "parameters": {"p": "x", "n": 1, "b": true, "z": null, "l": [1, "a"]}});
        assert!(CreatePredictionRequest::from_json(&ok).is_ok());

        for parameters in [json!("x"), json!({"p": {"nested": 1}}), json!({"p": [[1]]})] {
            let body = json!({"modelId": "a/b", "parameters": parameters});
            assert!(CreatePredictionRequest::from_json(&body).is_err());
        }
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            boundary_status(&ReelgateError::AuthenticationFailed),
            (401, "Invalid API key".to_string())
        );
        assert_eq!(
            boundary_status(&ReelgateError::RateLimited { retry_after: None }).0,
            429
        );
        assert_eq!(
            boundary_status(&ReelgateError::PredictionNotFound("x".into())).0,
            404
        );
        let unavailable = ReelgateError::Api {
            status: 503,
            message: "down".into(),
        };
        assert_eq!(
            boundary_status(&unavailable),
            (503, UPSTREAM_UNAVAILABLE_MESSAGE.to_string())
        );
        let unprocessable = ReelgateError::Api {
            status: 422,
            message: "bad input".into(),
        };
        assert_eq!(boundary_status(&unprocessable), (422, "bad input".to_string()));
        let server = ReelgateError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(boundary_status(&server).0, 500);
        assert_eq!(boundary_status(&ReelgateError::Http("reset".into())).0, 500);
    }
}
