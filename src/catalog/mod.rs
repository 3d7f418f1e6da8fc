//! Model catalog: static metadata for the supported video models.
//!
//! The catalog is loaded once from a JSON seed compiled into the binary and
//! never mutated afterwards. Entries keep their seed order, which is also the
//! display order.

mod cost;

pub use cost::estimate_cost;

use crate::types::{Capability, VideoModel};

/// Read-only catalog of video models.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<VideoModel>,
}

impl ModelCatalog {
    /// Build a catalog from explicit entries.
    ///
    /// Entries violating model invariants, or repeating an id already seen,
    /// are dropped with a warning.
    pub fn from_models(models: impl IntoIterator<Item = VideoModel>) -> Self {
        let mut catalog = Self::default();
        for model in models {
            if let Err(reason) = model.check_invariants() {
                tracing::warn!(model = %model.id, %reason, "dropping invalid catalog entry");
                continue;
            }
            if catalog.get(&model.id).is_some() {
                tracing::warn!(model = %model.id, "dropping duplicate catalog entry");
                continue;
            }
            catalog.models.push(model);
        }
        catalog
    }

    /// Create a catalog from the embedded seed data.
    pub fn with_embedded_seed() -> Self {
        match serde_json::from_str::<Vec<VideoModel>>(EMBEDDED_SEED) {
            Ok(models) => Self::from_models(models),
            Err(e) => {
                // Seed is compiled in and tested; an empty catalog is still usable.
                tracing::error!(error = %e, "failed to parse embedded model seed");
                Self::default()
            }
        }
    }

    /// Look up a model by id (`owner/name`).
    pub fn get(&self, id: &str) -> Option<&VideoModel> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Models supporting `capability`, in catalog order.
    pub fn by_capability(&self, capability: Capability) -> Vec<&VideoModel> {
        self.models
            .iter()
            .filter(|m| m.capabilities.supports(capability))
            .collect()
    }

    /// All models in catalog order.
    pub fn list(&self) -> &[VideoModel] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Raw JSON seed data compiled into the binary.
const EMBEDDED_SEED: &str = include_str!("seed.json");
