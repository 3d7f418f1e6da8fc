//! Boundary service between clients and the upstream provider.
//!
//! This module provides:
//! - The transport-agnostic proxy (`service`)
//! - The axum HTTP router (`routes`, server-only)
//! - Configuration types (`config`, server-only)

#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod routes;
pub mod service;

pub use service::{CreatePredictionRequest, ProxyService, UPSTREAM_UNAVAILABLE_MESSAGE, boundary_status};
