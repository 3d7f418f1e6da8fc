//! Reelgate error types

use std::fmt;
use std::time::Duration;

use crate::types::GenerationId;
use crate::validation::ParameterError;

/// Reelgate error types
#[derive(Debug, thiserror::Error)]
pub enum ReelgateError {
    // Transport/network errors
    #[error("network error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    #[error("invalid API key")]
    AuthenticationFailed,

    #[error("Replicate API key not configured: {0}")]
    MissingCredential(String),

    // Lookup errors
    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("prediction not found: {0}")]
    PredictionNotFound(String),

    #[error("generation not found: {0}")]
    GenerationNotFound(GenerationId),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid API response: missing required fields")]
    InvalidResponse,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid parameters: {}", join_parameter_errors(.0))]
    Validation(Vec<ParameterError>),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Lifecycle errors
    #[error("maximum of {limit} concurrent generations reached")]
    ConcurrencyLimit { limit: usize },

    #[error("Polling timeout: Generation did not complete within {attempts} attempts")]
    PollingTimeout { attempts: u32 },

    /// Submission failed; wraps the root cause.
    #[error("Failed to start video generation: {0}")]
    Submission(#[source] Box<ReelgateError>),

    /// A status fetch failed while polling; wraps the root cause.
    #[error("Failed to poll generation status: {0}")]
    Polling(#[source] Box<ReelgateError>),

    #[error("Failed to cancel generation: {0}")]
    Cancel(#[source] Box<ReelgateError>),
}

/// User-facing error taxonomy.
///
/// Every [`ReelgateError`] falls into exactly one category; wrapper variants
/// (`Submission`, `Polling`, `Cancel`) report the category of their cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Local pre-flight parameter check failed; never sent to the network.
    Validation,
    /// Malformed request rejected at the boundary.
    Request,
    /// Credential missing or rejected.
    Auth,
    /// Upstream throttling.
    RateLimit,
    /// 502/503/504 from upstream, retried before surfacing.
    TransientUpstream,
    /// Unknown model, prediction or generation.
    NotFound,
    /// Polling budget exhausted without a terminal status.
    Timeout,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::Request => "request",
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::TransientUpstream => "transient_upstream",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl ReelgateError {
    /// Whether this error is a transient upstream failure worth retrying.
    ///
    /// Only Bad Gateway, Service Unavailable and Gateway Timeout qualify.
    /// Client errors, throttling and transport failures are surfaced as-is.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Api { status, .. } if matches!(*status, 502..=504))
    }

    /// Classify this error into the user-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidRequest(_) => ErrorKind::Request,
            Self::AuthenticationFailed | Self::MissingCredential(_) => ErrorKind::Auth,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::ModelNotFound(_) | Self::PredictionNotFound(_) | Self::GenerationNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::PollingTimeout { .. } => ErrorKind::Timeout,
            Self::Api { status, .. } => match *status {
                400 | 422 => ErrorKind::Request,
                401 | 403 => ErrorKind::Auth,
                404 => ErrorKind::NotFound,
                429 => ErrorKind::RateLimit,
                502..=504 => ErrorKind::TransientUpstream,
                _ => ErrorKind::Unknown,
            },
            Self::Submission(inner) | Self::Polling(inner) | Self::Cancel(inner) => inner.kind(),
            _ => ErrorKind::Unknown,
        }
    }

    /// Actionable sentence suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        crate::classify::classify(self)
    }

    /// The innermost error, looking through wrapper variants.
    pub fn root_cause(&self) -> &ReelgateError {
        match self {
            Self::Submission(inner) | Self::Polling(inner) | Self::Cancel(inner) => {
                inner.root_cause()
            }
            other => other,
        }
    }

    pub(crate) fn submission(cause: ReelgateError) -> Self {
        Self::Submission(Box::new(cause))
    }

    pub(crate) fn polling(cause: ReelgateError) -> Self {
        Self::Polling(Box::new(cause))
    }

    pub(crate) fn cancel(cause: ReelgateError) -> Self {
        Self::Cancel(Box::new(cause))
    }
}

fn join_parameter_errors(errors: &[ParameterError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for Reelgate operations
pub type Result<T> = std::result::Result<T, ReelgateError>;
