//! Reelgate - video generation gateway
//!
//! This crate launches text/image-to-video jobs against hosted model
//! providers (Replicate) and tracks them to completion: local parameter
//! validation, submission through a server-side boundary, fixed-cadence
//! polling, and a registry of generation state that UIs can subscribe to.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use reelgate::{HttpBoundary, ModelCatalog, Orchestrator, ParameterValues};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> reelgate::Result<()> {
//!     let catalog = Arc::new(ModelCatalog::with_embedded_seed());
//!     let boundary = Arc::new(HttpBoundary::new("http://127.0.0.1:9750")?);
//!     let orchestrator = Orchestrator::new(catalog, boundary);
//!
//!     let mut params = ParameterValues::new();
//!     params.insert("prompt".into(), json!("a lighthouse at dusk"));
//!
//!     let handle = orchestrator.start("google/veo-3", params).await?;
//!     let status = handle.wait().await;
//!     println!("{status}");
//!     Ok(())
//! }
//! ```
//!
//! # Layout
//!
//! - [`catalog`]: static model metadata and cost estimation
//! - [`validation`]: pre-flight parameter checks
//! - [`client`]: boundary client, submission and polling
//! - [`providers`]: upstream Replicate client and retry decorator
//! - [`server`]: the boundary service and its HTTP routes
//! - [`registry`]: generation state container
//! - [`orchestrator`]: lifecycle glue

pub mod catalog;
pub mod classify;
pub mod client;
pub mod error;
pub mod format;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod server;
pub mod telemetry;
pub mod types;
pub mod validation;
pub mod version;

// Re-export main types at crate root
pub use catalog::{ModelCatalog, estimate_cost};
pub use classify::{classify, classify_message};
pub use client::{HttpBoundary, PollConfig, PredictionBoundary, StatusPoller};
pub use error::{ErrorKind, ReelgateError, Result};
pub use orchestrator::{GenerationHandle, Orchestrator};
pub use providers::{PredictionProvider, ReplicateClient, RetryConfig};
pub use registry::GenerationRegistry;
pub use server::ProxyService;
pub use validation::{ParameterError, ValidationReport, validate_all, validate_parameter};
pub use version::{PKG_VERSION, version_string};

// Re-export all types
pub use types::{
    Capability, Generation, GenerationId, GenerationStatus, GenerationUpdate, GenerationsState,
    ModelCapabilities, ParameterDef, ParameterKind, ParameterValues, Performance, Prediction,
    PredictionStatus, Pricing, PricingUnit, SelectOption, VideoModel,
};
