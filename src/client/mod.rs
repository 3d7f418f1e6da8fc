//! Client side of the boundary: submission, cancellation and polling.
//!
//! Everything here talks to a [`PredictionBoundary`]; the upstream provider
//! and its credentials stay on the server side.

mod boundary;
mod poller;
mod submit;

pub use boundary::{HttpBoundary, PredictionBoundary};
pub use poller::{PollConfig, StatusPoller};
pub use submit::{cancel, submit};
