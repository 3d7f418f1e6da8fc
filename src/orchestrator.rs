//! Generation lifecycle orchestration.
//!
//! [`Orchestrator::start`] runs one job from parameters to a final state:
//!
//! 1. catalog lookup, defaults, local validation (nothing is sent on failure)
//! 2. registry insert as `queued`, gated on the active count
//! 3. submission through the boundary
//! 4. a spawned poll task mapping every observation into registry updates
//!
//! The registry is the only place generation state lives; the poll task
//! holds just the ids it needs plus shared handles.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::{ModelCatalog, estimate_cost};
use crate::classify::{classify, classify_message};
use crate::client::{self, PollConfig, PredictionBoundary, StatusPoller};
use crate::registry::GenerationRegistry;
use crate::telemetry;
use crate::types::{
    Generation, GenerationId, GenerationStatus, GenerationUpdate, ParameterValues, Prediction,
    PredictionStatus, VideoModel, unix_millis,
};
use crate::validation::{apply_defaults, validate_all};
use crate::{ReelgateError, Result};

/// Default cap on simultaneously active generations.
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// A started generation.
#[derive(Debug)]
pub struct GenerationHandle {
    pub id: GenerationId,
    /// Remote prediction id assigned by the provider.
    pub prediction_id: String,
    task: JoinHandle<GenerationStatus>,
}

impl GenerationHandle {
    /// Wait for the poll task to finish and return the final local status.
    ///
    /// A poll task that panicked or was aborted reports `Error`.
    pub async fn wait(self) -> GenerationStatus {
        self.task.await.unwrap_or(GenerationStatus::Error)
    }

    /// Stop tracking the job locally. The remote job is unaffected.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Drives generations through submit, poll and completion.
pub struct Orchestrator {
    catalog: Arc<ModelCatalog>,
    registry: Arc<GenerationRegistry>,
    boundary: Arc<dyn PredictionBoundary>,
    poller: StatusPoller,
    max_concurrent: usize,
}

impl Orchestrator {
    /// Create an orchestrator with a fresh registry and default polling.
    pub fn new(catalog: Arc<ModelCatalog>, boundary: Arc<dyn PredictionBoundary>) -> Self {
        Self {
            catalog,
            registry: Arc::new(GenerationRegistry::new()),
            poller: StatusPoller::new(boundary.clone(), PollConfig::default()),
            boundary,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Share an existing registry.
    pub fn with_registry(mut self, registry: Arc<GenerationRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn poll_config(mut self, config: PollConfig) -> Self {
        self.poller = StatusPoller::new(self.boundary.clone(), config);
        self
    }

    pub fn max_concurrent(mut self, limit: usize) -> Self {
        self.max_concurrent = limit;
        self
    }

    pub fn registry(&self) -> &Arc<GenerationRegistry> {
        &self.registry
    }

    pub fn catalog(&self) -> &Arc<ModelCatalog> {
        &self.catalog
    }

    /// Validate, submit and start polling a new generation.
    ///
    /// Validation and admission failures leave the registry untouched. A
    /// submission failure leaves an `error` record behind and is returned.
    pub async fn start(
        &self,
        model_id: &str,
        mut parameters: ParameterValues,
    ) -> Result<GenerationHandle> {
        let model = self
            .catalog
            .get(model_id)
            .cloned()
            .ok_or_else(|| ReelgateError::ModelNotFound(model_id.to_string()))?;

        apply_defaults(&mut parameters, &model.parameters);
        validate_all(&parameters, &model.parameters).into_result()?;

        let id = self.registry.next_id();
        let mut generation = Generation::new(id, model_id, parameters.clone())
            .with_status(GenerationStatus::Queued);
        generation.start_time = Some(unix_millis());
        if !self.registry.try_add(generation, self.max_concurrent) {
            return Err(ReelgateError::ConcurrencyLimit {
                limit: self.max_concurrent,
            });
        }
        info!(generation = %id, model = model_id, "generation queued");

        let prediction = match client::submit(self.boundary.as_ref(), model_id, &parameters).await
        {
            Ok(p) => p,
            Err(e) => {
                warn!(generation = %id, model = model_id, error = %e, "submission failed");
                self.registry.update(
                    id,
                    GenerationUpdate::new()
                        .status(GenerationStatus::Error)
                        .error(classify(&e))
                        .end_time(unix_millis()),
                );
                record_final(model_id, GenerationStatus::Error);
                return Err(e);
            }
        };

        self.registry
            .update(id, GenerationUpdate::new().prediction_id(&prediction.id));
        let tracker = Tracker {
            registry: self.registry.clone(),
            id,
            model,
            parameters,
        };
        let status = tracker.observe(&prediction);

        let prediction_id = prediction.id.clone();
        let task = if prediction.is_terminal() {
            tokio::spawn(async move { status })
        } else {
            let poller = self.poller.clone();
            let remote = prediction_id.clone();
            tokio::spawn(async move { tracker.run(poller, remote).await })
        };

        Ok(GenerationHandle {
            id,
            prediction_id,
            task,
        })
    }

    /// Ask the provider to cancel a generation.
    ///
    /// Local status is not changed here; the poll loop observes the
    /// `canceled` status on its next fetch.
    pub async fn cancel(&self, id: GenerationId) -> Result<()> {
        let generation = self
            .registry
            .get(id)
            .ok_or(ReelgateError::GenerationNotFound(id))?;
        let prediction_id = generation.prediction_id.ok_or_else(|| {
            ReelgateError::cancel(ReelgateError::InvalidRequest(format!(
                "{id} has no remote prediction"
            )))
        })?;
        client::cancel(self.boundary.as_ref(), &prediction_id).await?;
        info!(generation = %id, prediction = %prediction_id, "cancel requested");
        Ok(())
    }

    /// Re-check a `stalled` generation once.
    ///
    /// A terminal remote status is applied as the poll loop would apply it.
    /// Anything else leaves the generation `stalled`: no poll task is
    /// running for it, so it must not count as active. Generations in any
    /// other local status are rejected.
    pub async fn refresh(&self, id: GenerationId) -> Result<Generation> {
        let generation = self
            .registry
            .get(id)
            .ok_or(ReelgateError::GenerationNotFound(id))?;
        if generation.status != GenerationStatus::Stalled {
            return Err(ReelgateError::InvalidRequest(format!(
                "{id} is {}; only stalled generations can be refreshed",
                generation.status
            )));
        }
        let prediction_id = generation.prediction_id.clone().ok_or_else(|| {
            ReelgateError::polling(ReelgateError::InvalidRequest(format!(
                "{id} has no remote prediction"
            )))
        })?;
        let model = self
            .catalog
            .get(&generation.model_id)
            .cloned()
            .ok_or_else(|| ReelgateError::ModelNotFound(generation.model_id.clone()))?;

        let prediction = self
            .poller
            .fetch(&prediction_id)
            .await
            .map_err(ReelgateError::polling)?;
        if !prediction.is_terminal() {
            debug!(generation = %id, prediction = %prediction_id, status = ?prediction.status, "still running");
            return Ok(generation);
        }

        let tracker = Tracker {
            registry: self.registry.clone(),
            id,
            model,
            parameters: generation.parameters,
        };
        tracker.observe(&prediction);
        self.registry
            .get(id)
            .ok_or(ReelgateError::GenerationNotFound(id))
    }
}

/// Everything a poll task needs to map observations into the registry.
struct Tracker {
    registry: Arc<GenerationRegistry>,
    id: GenerationId,
    model: VideoModel,
    parameters: ParameterValues,
}

impl Tracker {
    async fn run(self, poller: StatusPoller, prediction_id: String) -> GenerationStatus {
        match poller.poll(&prediction_id, |p| {
            self.observe(p);
        })
        .await
        {
            Ok(prediction) => GenerationStatus::from(prediction.status),
            Err(e @ ReelgateError::PollingTimeout { .. }) => {
                warn!(generation = %self.id, prediction = %prediction_id, "polling gave up");
                self.registry.update(
                    self.id,
                    GenerationUpdate::new()
                        .status(GenerationStatus::Stalled)
                        .error(classify(&e)),
                );
                record_final(&self.model.id, GenerationStatus::Stalled);
                GenerationStatus::Stalled
            }
            Err(e) => {
                warn!(generation = %self.id, prediction = %prediction_id, error = %e, "polling failed");
                self.registry.update(
                    self.id,
                    GenerationUpdate::new()
                        .status(GenerationStatus::Error)
                        .error(classify(&e))
                        .end_time(unix_millis()),
                );
                record_final(&self.model.id, GenerationStatus::Error);
                GenerationStatus::Error
            }
        }
    }

    /// Apply one observation and return the resulting local status.
    fn observe(&self, prediction: &Prediction) -> GenerationStatus {
        let status = GenerationStatus::from(prediction.status);
        let mut update = GenerationUpdate::new().status(status);
        match prediction.status {
            PredictionStatus::Starting | PredictionStatus::Processing => {}
            PredictionStatus::Succeeded => {
                update = update
                    .video_url(prediction.video_url())
                    .end_time(unix_millis())
                    .cost(Some(estimate_cost(&self.model, &self.parameters)))
                    .clear_error();
            }
            PredictionStatus::Failed => {
                update = update
                    .error(classify_message(prediction.error.as_deref()))
                    .end_time(unix_millis());
            }
            PredictionStatus::Canceled => {
                update = update.end_time(unix_millis()).clear_error();
            }
        }

        debug!(generation = %self.id, prediction = %prediction.id, %status, "observed");
        self.registry.update(self.id, update);
        if prediction.is_terminal() {
            record_final(&self.model.id, status);
        }
        status
    }
}

fn record_final(model: &str, status: GenerationStatus) {
    metrics::counter!(telemetry::GENERATIONS_TOTAL,
        "model" => model.to_owned(),
        "status" => status.as_str(),
    )
    .increment(1);
    info!(model, %status, "generation finished");
}
