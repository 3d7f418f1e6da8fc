//! Telemetry metric name constants.
//!
//! Centralised metric names for reelgate operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `reelgate_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: upstream provider name (e.g. "replicate")
//! - `operation`: call made (e.g. "create_prediction", "get_prediction")
//! - `status`: outcome: "ok" or "error"

/// Total requests handled by the boundary.
///
/// Labels: `provider`, `operation`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "reelgate_requests_total";

/// Boundary request duration in seconds.
///
/// Labels: `provider`, `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "reelgate_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`, `operation`.
pub const RETRIES_TOTAL: &str = "reelgate_retries_total";

/// Total status fetches made by pollers.
///
/// Labels: `status` ("ok" | "error").
pub const POLLS_TOTAL: &str = "reelgate_polls_total";

/// Generations reaching a final local status.
///
/// Labels: `model`, `status` ("completed" | "error" | "canceled" | "stalled").
pub const GENERATIONS_TOTAL: &str = "reelgate_generations_total";
