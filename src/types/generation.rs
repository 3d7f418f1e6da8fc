//! Generation lifecycle types.
//!
//! A [`Generation`] is the local record of one user-initiated video job.
//! Records are owned by the [`GenerationRegistry`](crate::registry::GenerationRegistry)
//! and change only through [`GenerationUpdate`]s applied by the registry.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::parameter::ParameterValues;
use super::prediction::PredictionStatus;

/// Local identifier of a generation. Assigned once, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(pub u64);

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Local status of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Idle,
    Queued,
    Processing,
    Completed,
    Error,
    Canceled,
    /// Polling gave up before the job reached a terminal state. The job may
    /// still finish upstream; it can be re-checked.
    Stalled,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Canceled => "canceled",
            Self::Stalled => "stalled",
        }
    }

    /// Queued or processing; counts against the concurrency gate.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Processing)
    }

    /// Completed, errored or canceled; removed by `clear_completed`.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Canceled)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PredictionStatus> for GenerationStatus {
    fn from(status: PredictionStatus) -> Self {
        match status {
            PredictionStatus::Starting => Self::Queued,
            PredictionStatus::Processing => Self::Processing,
            PredictionStatus::Succeeded => Self::Completed,
            PredictionStatus::Failed => Self::Error,
            PredictionStatus::Canceled => Self::Canceled,
        }
    }
}

/// One video generation job and its tracked lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub id: GenerationId,
    /// Catalog model id; may reference a model no longer in the catalog.
    pub model_id: String,
    pub parameters: ParameterValues,
    pub status: GenerationStatus,
    /// Set only on success.
    pub video_url: Option<String>,
    /// Set only on failure.
    pub error: Option<String>,
    /// Unix milliseconds.
    pub start_time: Option<i64>,
    /// Unix milliseconds.
    pub end_time: Option<i64>,
    /// Cost in USD, once known.
    pub cost: Option<f64>,
    /// Remote prediction id, once the provider acknowledged the job.
    pub prediction_id: Option<String>,
}

impl Generation {
    /// Create an idle generation.
    pub fn new(id: GenerationId, model_id: impl Into<String>, parameters: ParameterValues) -> Self {
        Self {
            id,
            model_id: model_id.into(),
            parameters,
            status: GenerationStatus::Idle,
            video_url: None,
            error: None,
            start_time: None,
            end_time: None,
            cost: None,
            prediction_id: None,
        }
    }

    /// Set the initial status.
    pub fn with_status(mut self, status: GenerationStatus) -> Self {
        self.status = status;
        self
    }

    /// Elapsed milliseconds between start and end (or `now` if still running).
    pub fn elapsed_millis(&self, now: i64) -> Option<i64> {
        let start = self.start_time?;
        Some((self.end_time.unwrap_or(now) - start).max(0))
    }
}

/// Partial update merged into a generation by the registry.
///
/// `None` leaves a field untouched. Nullable fields take `Option<Option<_>>`
/// so an update can also clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationUpdate {
    pub status: Option<GenerationStatus>,
    pub video_url: Option<Option<String>>,
    pub error: Option<Option<String>>,
    pub start_time: Option<Option<i64>>,
    pub end_time: Option<Option<i64>>,
    pub cost: Option<Option<f64>>,
    pub prediction_id: Option<Option<String>>,
}

impl GenerationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: GenerationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn video_url(mut self, url: Option<String>) -> Self {
        self.video_url = Some(url);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(Some(message.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }

    pub fn start_time(mut self, millis: i64) -> Self {
        self.start_time = Some(Some(millis));
        self
    }

    pub fn end_time(mut self, millis: i64) -> Self {
        self.end_time = Some(Some(millis));
        self
    }

    pub fn cost(mut self, cost: Option<f64>) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn prediction_id(mut self, id: impl Into<String>) -> Self {
        self.prediction_id = Some(Some(id.into()));
        self
    }

    /// Whether the update would leave a record unchanged.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge into `generation`; identity fields (id, model, parameters) are never touched.
    pub fn apply_to(&self, generation: &mut Generation) {
        if let Some(status) = self.status {
            generation.status = status;
        }
        if let Some(url) = &self.video_url {
            generation.video_url = url.clone();
        }
        if let Some(error) = &self.error {
            generation.error = error.clone();
        }
        if let Some(start) = self.start_time {
            generation.start_time = start;
        }
        if let Some(end) = self.end_time {
            generation.end_time = end;
        }
        if let Some(cost) = self.cost {
            generation.cost = cost;
        }
        if let Some(id) = &self.prediction_id {
            generation.prediction_id = id.clone();
        }
    }
}

/// Immutable snapshot of all generations.
///
/// `active_count` is derived from `items` on construction and cannot be set
/// independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationsState {
    items: Vec<Generation>,
    active_count: usize,
}

impl GenerationsState {
    /// Build a state from items, deriving the active count.
    pub fn new(items: Vec<Generation>) -> Self {
        let active_count = items.iter().filter(|g| g.status.is_active()).count();
        Self {
            items,
            active_count,
        }
    }

    /// Generations in insertion order.
    pub fn items(&self) -> &[Generation] {
        &self.items
    }

    /// Number of generations in `queued` or `processing`.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn get(&self, id: GenerationId) -> Option<&Generation> {
        self.items.iter().find(|g| g.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
