//! Prediction records exchanged with the boundary and the upstream provider.
//!
//! Responses are never trusted blindly: [`Prediction::from_value`] checks the
//! minimum shape (string `id` and `status`) and normalizes every optional
//! field to a defined default, so downstream code never deals with missing
//! keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ReelgateError, Result};

/// Status of a prediction as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictionStatus {
    type Err = ReelgateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "starting" => Ok(Self::Starting),
            "processing" => Ok(Self::Processing),
            "succeeded" => Ok(Self::Succeeded),
            // `aborted` is a run terminated before it started (deadline or
            // shutdown); it is final, so it is reported as a failure.
            "failed" | "aborted" => Ok(Self::Failed),
            // Replicate uses the American spelling; accept the British one too.
            "canceled" | "cancelled" => Ok(Self::Canceled),
            _ => Err(ReelgateError::InvalidResponse),
        }
    }
}

/// Timing metrics reported for a prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predict_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
}

/// Provider URLs for a prediction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: String,
    #[serde(default)]
    pub cancel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
}

/// Canonical prediction (remote job) record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub input: Map<String, Value>,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub logs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<PredictionMetrics>,
    #[serde(default)]
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub urls: PredictionUrls,
}

impl Prediction {
    /// Create a prediction with only the required fields set.
    pub fn new(id: impl Into<String>, status: PredictionStatus) -> Self {
        Self {
            id: id.into(),
            status,
            input: Map::new(),
            output: None,
            error: None,
            logs: None,
            metrics: None,
            created_at: String::new(),
            started_at: None,
            completed_at: None,
            version: String::new(),
            urls: PredictionUrls::default(),
        }
    }

    /// Parse an untrusted JSON value into a prediction.
    ///
    /// Fails with [`ReelgateError::InvalidResponse`] unless the value is an
    /// object carrying a string `id` and a known string `status`. Optional
    /// fields that are missing, null, empty or of the wrong type are
    /// normalized to `None` (nullable fields) or `""` (string fields).
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut obj) = value else {
            return Err(ReelgateError::InvalidResponse);
        };
        let id = match obj.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => return Err(ReelgateError::InvalidResponse),
        };
        let status = match obj.get("status") {
            Some(Value::String(status)) => status.parse()?,
            _ => return Err(ReelgateError::InvalidResponse),
        };

        let input = match obj.remove("input") {
            Some(Value::Object(input)) => input,
            _ => Map::new(),
        };
        let output = obj.remove("output").filter(is_truthy);
        let metrics = obj
            .remove("metrics")
            .filter(Value::is_object)
            .and_then(|m| serde_json::from_value(m).ok());
        let urls = obj.remove("urls").unwrap_or(Value::Null);

        Ok(Self {
            id,
            status,
            input,
            output,
            error: opt_text(&obj, "error"),
            logs: opt_text(&obj, "logs"),
            metrics,
            created_at: opt_text(&obj, "created_at").unwrap_or_default(),
            started_at: opt_text(&obj, "started_at"),
            completed_at: opt_text(&obj, "completed_at"),
            version: opt_text(&obj, "version").unwrap_or_default(),
            urls: PredictionUrls {
                get: url_field(&urls, "get").unwrap_or_default(),
                cancel: url_field(&urls, "cancel").unwrap_or_default(),
                stream: url_field(&urls, "stream"),
            },
        })
    }

    /// URL of the generated video, if the output carries one.
    ///
    /// Video models return either a single URL, a list of URLs, or an object
    /// whose values are URLs; the first URL found wins.
    pub fn video_url(&self) -> Option<String> {
        fn first_url(value: &Value) -> Option<String> {
            match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Array(items) => items.iter().find_map(first_url),
                Value::Object(map) => map.values().find_map(first_url),
                _ => None,
            }
        }
        self.output.as_ref().and_then(first_url)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Falsy JSON values (null, false, 0, "") are treated as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Non-empty text for `key`; non-string values are rendered as JSON.
fn opt_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(v) if is_truthy(v) => Some(v.to_string()),
        _ => None,
    }
}

fn url_field(urls: &Value, key: &str) -> Option<String> {
    urls.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
