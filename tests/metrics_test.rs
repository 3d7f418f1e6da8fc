//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use reelgate::client::{PollConfig, PredictionBoundary, StatusPoller};
use reelgate::telemetry;
use reelgate::{
    ModelCatalog, Orchestrator, ParameterValues, PredictionProvider, ProxyService, ReelgateError,
    Result, RetryConfig,
};
use serde_json::{Value, json};

// ============================================================================
// Mocks
// ============================================================================

/// Upstream whose first `failures` calls return 503.
struct FlakyUpstream {
    failures: AtomicU32,
}

impl FlakyUpstream {
    fn new(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl PredictionProvider for FlakyUpstream {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn latest_version(&self, _model_id: &str) -> Result<String> {
        if self
            .failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ReelgateError::Api {
                status: 503,
                message: "Service Unavailable".into(),
            });
        }
        Ok("v1".into())
    }

    async fn create_prediction(&self, _version: &str, _input: &ParameterValues) -> Result<Value> {
        Ok(json!({"id": "p1", "status": "starting"}))
    }

    async fn get_prediction(&self, _id: &str) -> Result<Value> {
        Err(ReelgateError::AuthenticationFailed)
    }

    async fn cancel_prediction(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}

/// Boundary whose predictions finish on creation.
struct InstantBoundary;

#[async_trait]
impl PredictionBoundary for InstantBoundary {
    async fn create_prediction(
        &self,
        _model_id: &str,
        _parameters: &ParameterValues,
    ) -> Result<Value> {
        Ok(json!({"id": "p1", "status": "succeeded", "output": "https://x/v.mp4"}))
    }

    async fn get_prediction(&self, id: &str) -> Result<Value> {
        Ok(json!({"id": id, "status": "succeeded"}))
    }

    async fn cancel_prediction(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    counter_with_label(snapshot, name, None)
}

/// Sum counters matching `name` and, if given, a `(label, value)` pair.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: Option<(&str, &str)>) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .filter(|(key, _, _, _)| {
            label.is_none_or(|(k, v)| key.key().labels().any(|l| l.key() == k && l.value() == v))
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

fn create_body() -> Value {
    json!({"modelId": "google/veo-3", "parameters": {"prompt": "a cat"}})
}

fn fast_retry() -> RetryConfig {
    RetryConfig::new().initial_delay(Duration::from_millis(1))
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn successful_request_records_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let service = ProxyService::new(Arc::new(FlakyUpstream::new(0)), fast_retry());
                service.create_from_json(&create_body()).await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();

    let count = counter_with_label(
        &snapshot,
        telemetry::REQUESTS_TOTAL,
        Some(("status", "ok")),
    );
    assert_eq!(count, 1, "expected 1 request counter");
    assert_eq!(counter_total(&snapshot, telemetry::RETRIES_TOTAL), 0);

    assert!(
        has_histogram(&snapshot, telemetry::REQUEST_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn retries_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let service = ProxyService::new(Arc::new(FlakyUpstream::new(2)), fast_retry());
                service.create_from_json(&create_body()).await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();
    let retries = counter_with_label(
        &snapshot,
        telemetry::RETRIES_TOTAL,
        Some(("operation", "latest_version")),
    );
    assert_eq!(retries, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_request_records_error_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let service = ProxyService::new(Arc::new(FlakyUpstream::new(0)), fast_retry());
                service.get("p1").await
            })
        })
    });
    assert!(result.is_err());

    let snapshot = snapshotter.snapshot().into_vec();
    let count = counter_with_label(
        &snapshot,
        telemetry::REQUESTS_TOTAL,
        Some(("status", "error")),
    );
    assert_eq!(count, 1, "expected 1 request counter for error");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn polls_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let config = PollConfig::new()
                    .initial_delay(Duration::ZERO)
                    .interval(Duration::ZERO);
                let poller = StatusPoller::new(Arc::new(InstantBoundary), config);
                poller.poll("p1", |_| {}).await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_with_label(&snapshot, telemetry::POLLS_TOTAL, Some(("status", "ok"))),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn finished_generations_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let status = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let orchestrator = Orchestrator::new(
                    Arc::new(ModelCatalog::with_embedded_seed()),
                    Arc::new(InstantBoundary),
                );
                let mut params = ParameterValues::new();
                params.insert("prompt".into(), json!("a cat"));
                let handle = orchestrator.start("google/veo-3", params).await?;
                Ok::<_, ReelgateError>(handle.wait().await)
            })
        })
    });
    assert_eq!(status.unwrap(), reelgate::GenerationStatus::Completed);

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::GENERATIONS_TOTAL,
            Some(("status", "completed"))
        ),
        1
    );
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let service = ProxyService::new(Arc::new(FlakyUpstream::new(1)), fast_retry());
    service.create_from_json(&create_body()).await.unwrap();
}
