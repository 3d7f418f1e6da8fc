//! Live integration tests for ReplicateClient.
//!
//! These tests hit the real Replicate API and are `#[ignore]` by default.
//! Only read-only calls are made; nothing is billed.
//!
//! Run with: `REPLICATE_API_KEY=r8_xxx cargo test --test replicate_live_test -- --ignored`

use reelgate::{ReelgateError, ReplicateClient};

fn client() -> ReplicateClient {
    ReplicateClient::from_env().expect("REPLICATE_API_KEY must be set for live tests")
}

#[tokio::test]
#[ignore = "requires REPLICATE_API_KEY"]
async fn test_live_latest_version() {
    let version = client()
        .latest_version("minimax/video-01")
        .await
        .expect("live model lookup should succeed");
    assert!(!version.is_empty());
}

#[tokio::test]
#[ignore = "requires REPLICATE_API_KEY"]
async fn test_live_unknown_prediction() {
    let err = client()
        .get_prediction("reelgate-does-not-exist")
        .await
        .unwrap_err();
    assert!(
        matches!(err, ReelgateError::PredictionNotFound(_)),
        "unexpected error: {err:?}"
    );
}
