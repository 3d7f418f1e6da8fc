//! Upstream provider clients and decorators.
//!
//! The boundary reaches the video provider through [`PredictionProvider`].
//! [`ReplicateClient`] is the HTTP implementation; [`RetryingPredictionProvider`]
//! adds bounded backoff on transient failures.

pub mod replicate;
pub mod retry;
pub mod traits;

pub use replicate::ReplicateClient;
pub use retry::{RetryConfig, RetryingPredictionProvider, with_retry};
pub use traits::PredictionProvider;
