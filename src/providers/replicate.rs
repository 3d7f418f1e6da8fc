//! Replicate HTTP API client.
//!
//! Covers the four calls the boundary needs: model lookup (for the latest
//! version id), prediction create, get and cancel.
//! See: <https://replicate.com/docs/reference/http>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::traits::PredictionProvider;
use crate::types::ParameterValues;
use crate::{ReelgateError, Result};

/// Default base URL for the Replicate API
pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable consulted when no secrets file provides a key.
pub const API_KEY_ENV_VAR: &str = "REPLICATE_API_KEY";

/// Values shipped in example env files; never real credentials.
const PLACEHOLDER_KEYS: &[&str] = &["your_replicate_api_key", "your_api_key"];

/// Pick the first configured key and reject blank or placeholder values.
pub fn resolve_api_key(from_file: Option<String>, from_env: Option<String>) -> Result<String> {
    let key = from_file.or(from_env).unwrap_or_default();
    let trimmed = key.trim();
    if trimmed.is_empty() || PLACEHOLDER_KEYS.iter().any(|p| trimmed.contains(p)) {
        return Err(ReelgateError::MissingCredential(format!(
            "set {API_KEY_ENV_VAR} or add [replicate] api_key to ~/.reelgate/secrets.toml \
             (tokens: https://replicate.com/account/api-tokens)"
        )));
    }
    Ok(trimmed.to_string())
}

/// Client for the Replicate HTTP API.
#[derive(Clone)]
pub struct ReplicateClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl std::fmt::Debug for ReplicateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ReplicateClient {
    /// Create a new client with the given API token.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client keyed from `REPLICATE_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::new(resolve_api_key(None, std::env::var(API_KEY_ENV_VAR).ok())?)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL and request timeout.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(crate::version::user_agent())
            .build()
            .map_err(|e| ReelgateError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Look up the latest version id of `model_id` (`owner/name`).
    pub async fn latest_version(&self, model_id: &str) -> Result<String> {
        let url = format!("{}/v1/models/{}", self.base_url, model_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ReelgateError::Http(e.to_string()))?;

        let response = handle_response_errors(response, Lookup::Model(model_id)).await?;

        let model: ModelResponse = response
            .json()
            .await
            .map_err(|e| ReelgateError::Http(e.to_string()))?;

        model
            .latest_version
            .map(|v| v.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ReelgateError::ModelNotFound(format!("{model_id} has no versions")))
    }

    /// Create a prediction for a model version.
    pub async fn create_prediction(&self, version: &str, input: &ParameterValues) -> Result<Value> {
        let url = format!("{}/v1/predictions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&CreatePredictionRequest { version, input })
            .send()
            .await
            .map_err(|e| ReelgateError::Http(e.to_string()))?;

        let response = handle_response_errors(response, Lookup::Version(version)).await?;

        response
            .json()
            .await
            .map_err(|e| ReelgateError::Http(e.to_string()))
    }

    /// Fetch a prediction by id.
    pub async fn get_prediction(&self, id: &str) -> Result<Value> {
        let url = format!("{}/v1/predictions/{}", self.base_url, id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ReelgateError::Http(e.to_string()))?;

        let response = handle_response_errors(response, Lookup::Prediction(id)).await?;

        response
            .json()
            .await
            .map_err(|e| ReelgateError::Http(e.to_string()))
    }

    /// Cancel a prediction by id.
    pub async fn cancel_prediction(&self, id: &str) -> Result<()> {
        let url = format!("{}/v1/predictions/{}/cancel", self.base_url, id);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ReelgateError::Http(e.to_string()))?;

        handle_response_errors(response, Lookup::Prediction(id)).await?;
        Ok(())
    }
}

/// What a request was addressing, for 404 mapping.
enum Lookup<'a> {
    Model(&'a str),
    Version(&'a str),
    Prediction(&'a str),
}

/// Check response status and map to the appropriate error.
async fn handle_response_errors(
    response: reqwest::Response,
    lookup: Lookup<'_>,
) -> Result<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 => Err(ReelgateError::AuthenticationFailed),
        404 => Err(match lookup {
            Lookup::Model(id) => ReelgateError::ModelNotFound(id.to_string()),
            Lookup::Version(version) => ReelgateError::ModelNotFound(format!("version {version}")),
            Lookup::Prediction(id) => ReelgateError::PredictionNotFound(id.to_string()),
        }),
        429 => {
            // Try to parse retry-after header
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(ReelgateError::RateLimited { retry_after })
        }
        code => {
            let detail = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.detail.or(body.title))
                .unwrap_or_else(|| format!("Replicate API error: {status}"));
            Err(ReelgateError::Api {
                status: code,
                message: detail,
            })
        }
    }
}

#[derive(Serialize)]
struct CreatePredictionRequest<'a> {
    version: &'a str,
    input: &'a ParameterValues,
}

#[derive(Deserialize)]
struct ModelResponse {
    latest_version: Option<VersionResponse>,
}

#[derive(Deserialize)]
struct VersionResponse {
    id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    detail: Option<String>,
    title: Option<String>,
}

// ============================================================================
// Provider Trait Implementation
// ============================================================================

#[async_trait]
impl PredictionProvider for ReplicateClient {
    fn name(&self) -> &str {
        "replicate"
    }

    async fn latest_version(&self, model_id: &str) -> Result<String> {
        ReplicateClient::latest_version(self, model_id).await
    }

    async fn create_prediction(&self, version: &str, input: &ParameterValues) -> Result<Value> {
        ReplicateClient::create_prediction(self, version, input).await
    }

    async fn get_prediction(&self, id: &str) -> Result<Value> {
        ReplicateClient::get_prediction(self, id).await
    }

    async fn cancel_prediction(&self, id: &str) -> Result<()> {
        ReplicateClient::cancel_prediction(self, id).await
    }
}
