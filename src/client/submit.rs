//! Submission and cancellation through the boundary.

use super::boundary::PredictionBoundary;
use crate::types::{ParameterValues, Prediction};
use crate::{ReelgateError, Result};

/// Create a prediction for `model_id` and return the normalized record.
///
/// Any failure, including a malformed response, is wrapped in
/// [`ReelgateError::Submission`].
pub async fn submit(
    boundary: &dyn PredictionBoundary,
    model_id: &str,
    parameters: &ParameterValues,
) -> Result<Prediction> {
    let raw = boundary
        .create_prediction(model_id, parameters)
        .await
        .map_err(ReelgateError::submission)?;
    let prediction = Prediction::from_value(raw).map_err(ReelgateError::submission)?;
    tracing::debug!(model = model_id, prediction = %prediction.id, status = %prediction.status, "prediction created");
    Ok(prediction)
}

/// Ask the boundary to cancel a prediction.
///
/// Failures are wrapped in [`ReelgateError::Cancel`].
pub async fn cancel(boundary: &dyn PredictionBoundary, prediction_id: &str) -> Result<()> {
    boundary
        .cancel_prediction(prediction_id)
        .await
        .map_err(ReelgateError::cancel)
}
