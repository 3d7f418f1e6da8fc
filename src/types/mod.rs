//! Public types for the Reelgate API.

mod generation;
mod model;
mod parameter;
mod prediction;

pub use generation::{
    Generation, GenerationId, GenerationStatus, GenerationUpdate, GenerationsState, unix_millis,
};
pub use model::{Capability, ModelCapabilities, Performance, Pricing, PricingUnit, VideoModel};
pub use parameter::{ParameterDef, ParameterKind, ParameterValues, SelectOption};
pub use prediction::{Prediction, PredictionMetrics, PredictionStatus, PredictionUrls};
