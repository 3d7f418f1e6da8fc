use serde_json::Value;

use crate::types::{ParameterValues, PricingUnit, VideoModel};

/// Parameter holding the requested video length in seconds.
const DURATION_PARAM: &str = "duration";

/// Estimated cost in USD of running `model` with `params`.
///
/// Per-second pricing is multiplied by the `duration` value, falling back to
/// the parameter's default and then to one second. Per-video pricing is flat.
pub fn estimate_cost(model: &VideoModel, params: &ParameterValues) -> f64 {
    match model.pricing.unit {
        PricingUnit::PerVideo => model.pricing.amount,
        PricingUnit::PerSecond => model.pricing.amount * duration_secs(model, params),
    }
}

fn duration_secs(model: &VideoModel, params: &ParameterValues) -> f64 {
    params
        .get(DURATION_PARAM)
        .and_then(Value::as_f64)
        .or_else(|| {
            model
                .parameter(DURATION_PARAM)
                .and_then(|p| p.default_if_set())
                .and_then(Value::as_f64)
        })
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(1.0)
}
