//! Tests for submission, cancellation and status polling.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reelgate::client::{self, PollConfig, PredictionBoundary, StatusPoller};
use reelgate::{ParameterValues, PredictionStatus, ReelgateError, Result};
use serde_json::{Value, json};
use tokio::time::Instant;

/// Boundary that replays scripted status responses.
///
/// The last scripted response repeats once the script runs out.
struct ScriptedBoundary {
    create: Value,
    statuses: Mutex<VecDeque<Value>>,
    fail_gets: bool,
    gets: AtomicU32,
    cancels: Mutex<Vec<String>>,
}

impl ScriptedBoundary {
    fn new(statuses: &[&str]) -> Self {
        Self {
            create: json!({"id": "p1", "status": "starting"}),
            statuses: Mutex::new(
                statuses
                    .iter()
                    .map(|s| json!({"id": "p1", "status": s}))
                    .collect(),
            ),
            fail_gets: false,
            gets: AtomicU32::new(0),
            cancels: Mutex::new(Vec::new()),
        }
    }

    fn get_count(&self) -> u32 {
        self.gets.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PredictionBoundary for ScriptedBoundary {
    async fn create_prediction(
        &self,
        _model_id: &str,
        _parameters: &ParameterValues,
    ) -> Result<Value> {
        Ok(self.create.clone())
    }

    async fn get_prediction(&self, _id: &str) -> Result<Value> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if self.fail_gets {
            return Err(ReelgateError::Api {
                status: 500,
                message: "HTTP 500: Internal Server Error".into(),
            });
        }
        let mut statuses = self.statuses.lock().unwrap();
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        Ok(next.unwrap_or(Value::Null))
    }

    async fn cancel_prediction(&self, id: &str) -> Result<()> {
        self.cancels.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

fn poller(boundary: &Arc<ScriptedBoundary>, config: PollConfig) -> StatusPoller {
    StatusPoller::new(boundary.clone(), config)
}

#[tokio::test(start_paused = true)]
async fn reports_every_status_in_order() {
    let boundary = Arc::new(ScriptedBoundary::new(&[
        "starting",
        "processing",
        "succeeded",
    ]));
    let poller = poller(&boundary, PollConfig::default());

    let started = Instant::now();
    let mut seen = Vec::new();
    let last = poller
        .poll("p1", |p| seen.push(p.status))
        .await
        .unwrap();

    assert_eq!(
        seen,
        vec![
            PredictionStatus::Starting,
            PredictionStatus::Processing,
            PredictionStatus::Succeeded
        ]
    );
    assert_eq!(last.status, PredictionStatus::Succeeded);
    assert_eq!(boundary.get_count(), 3);
    // 2s initial delay, then 3s between fetches.
    assert_eq!(started.elapsed(), Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn stops_at_first_terminal_status() {
    let boundary = Arc::new(ScriptedBoundary::new(&["failed", "succeeded"]));
    let poller = poller(&boundary, PollConfig::default());

    let last = poller.poll("p1", |_| {}).await.unwrap();
    assert_eq!(last.status, PredictionStatus::Failed);
    assert_eq!(boundary.get_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn aborted_run_ends_polling_as_failed() {
    let boundary = Arc::new(ScriptedBoundary::new(&["processing", "aborted"]));
    let poller = poller(&boundary, PollConfig::default());

    let last = poller.poll("p1", |_| {}).await.unwrap();
    assert_eq!(last.status, PredictionStatus::Failed);
    assert_eq!(boundary.get_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_attempts() {
    let boundary = Arc::new(ScriptedBoundary::new(&["processing"]));
    let config = PollConfig::new()
        .initial_delay(Duration::ZERO)
        .interval(Duration::from_secs(1))
        .max_attempts(5);
    let poller = poller(&boundary, config);

    let mut updates = 0;
    let err = poller.poll("p1", |_| updates += 1).await.unwrap_err();

    assert!(matches!(err, ReelgateError::PollingTimeout { attempts: 5 }));
    assert_eq!(boundary.get_count(), 5);
    assert_eq!(updates, 5);
}

#[tokio::test(start_paused = true)]
async fn fetch_error_stops_polling() {
    let mut scripted = ScriptedBoundary::new(&["processing"]);
    scripted.fail_gets = true;
    let boundary = Arc::new(scripted);
    let poller = poller(&boundary, PollConfig::default());

    let err = poller.poll("p1", |_| {}).await.unwrap_err();
    assert_eq!(boundary.get_count(), 1);
    assert!(matches!(
        err,
        ReelgateError::Polling(ref inner) if matches!(**inner, ReelgateError::Api { status: 500, .. })
    ));
    assert_eq!(
        err.to_string(),
        "Failed to poll generation status: API error (500): HTTP 500: Internal Server Error"
    );
}

#[tokio::test(start_paused = true)]
async fn malformed_status_is_a_polling_error() {
    let boundary = Arc::new(ScriptedBoundary::new(&[]));
    let poller = poller(&boundary, PollConfig::default());

    let err = poller.poll("p1", |_| {}).await.unwrap_err();
    assert!(matches!(
        err,
        ReelgateError::Polling(ref inner) if matches!(**inner, ReelgateError::InvalidResponse)
    ));
}

#[tokio::test]
async fn submit_normalizes_the_response() {
    let boundary = ScriptedBoundary::new(&[]);
    let prediction = client::submit(&boundary, "google/veo-3", &ParameterValues::new())
        .await
        .unwrap();
    assert_eq!(prediction.id, "p1");
    assert_eq!(prediction.status, PredictionStatus::Starting);
    assert!(prediction.output.is_none());
}

#[tokio::test]
async fn submit_wraps_malformed_responses() {
    let mut boundary = ScriptedBoundary::new(&[]);
    boundary.create = json!({"status": "starting"});

    let err = client::submit(&boundary, "google/veo-3", &ParameterValues::new())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to start video generation: Invalid API response: missing required fields"
    );
}

#[tokio::test]
async fn cancel_reaches_the_boundary() {
    let boundary = ScriptedBoundary::new(&[]);
    client::cancel(&boundary, "p1").await.unwrap();
    assert_eq!(*boundary.cancels.lock().unwrap(), vec!["p1".to_string()]);
}
