use std::error::Error as _;

use reelgate::validation::ParameterError;
use reelgate::{ErrorKind, GenerationId, ReelgateError};

fn api(status: u16) -> ReelgateError {
    ReelgateError::Api {
        status,
        message: "upstream said no".into(),
    }
}

#[test]
fn error_display() {
    let err = ReelgateError::ModelNotFound("google/veo-9".into());
    assert_eq!(err.to_string(), "model not found: google/veo-9");

    let err = ReelgateError::GenerationNotFound(GenerationId(7));
    assert_eq!(err.to_string(), "generation not found: gen-7");

    let err = ReelgateError::PollingTimeout { attempts: 400 };
    assert_eq!(
        err.to_string(),
        "Polling timeout: Generation did not complete within 400 attempts"
    );

    let err = ReelgateError::ConcurrencyLimit { limit: 5 };
    assert_eq!(err.to_string(), "maximum of 5 concurrent generations reached");
}

#[test]
fn only_gateway_failures_are_transient() {
    assert!(api(502).is_transient());
    assert!(api(503).is_transient());
    assert!(api(504).is_transient());

    assert!(!api(500).is_transient());
    assert!(!api(400).is_transient());
    assert!(!ReelgateError::RateLimited { retry_after: None }.is_transient());
    assert!(!ReelgateError::Http("reset".into()).is_transient());
    assert!(!ReelgateError::AuthenticationFailed.is_transient());
}

#[test]
fn kinds() {
    assert_eq!(ReelgateError::Validation(vec![]).kind(), ErrorKind::Validation);
    assert_eq!(
        ReelgateError::InvalidRequest("x".into()).kind(),
        ErrorKind::Request
    );
    assert_eq!(ReelgateError::AuthenticationFailed.kind(), ErrorKind::Auth);
    assert_eq!(
        ReelgateError::RateLimited { retry_after: None }.kind(),
        ErrorKind::RateLimit
    );
    assert_eq!(
        ReelgateError::PredictionNotFound("p".into()).kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        ReelgateError::PollingTimeout { attempts: 1 }.kind(),
        ErrorKind::Timeout
    );
    assert_eq!(api(503).kind(), ErrorKind::TransientUpstream);
    assert_eq!(api(401).kind(), ErrorKind::Auth);
    assert_eq!(api(429).kind(), ErrorKind::RateLimit);
    assert_eq!(api(422).kind(), ErrorKind::Request);
    assert_eq!(api(500).kind(), ErrorKind::Unknown);
    assert_eq!(ReelgateError::InvalidResponse.kind(), ErrorKind::Unknown);
}

#[test]
fn wrappers_report_the_cause() {
    let err = ReelgateError::Submission(Box::new(api(503)));
    assert_eq!(err.kind(), ErrorKind::TransientUpstream);
    assert_eq!(
        err.to_string(),
        "Failed to start video generation: API error (503): upstream said no"
    );
    assert!(matches!(err.root_cause(), ReelgateError::Api { status: 503, .. }));

    let source = err.source().expect("wrapper exposes its cause");
    assert_eq!(source.to_string(), "API error (503): upstream said no");

    let nested = ReelgateError::Polling(Box::new(ReelgateError::Cancel(Box::new(
        ReelgateError::AuthenticationFailed,
    ))));
    assert!(matches!(
        nested.root_cause(),
        ReelgateError::AuthenticationFailed
    ));
    assert_eq!(nested.kind(), ErrorKind::Auth);
}

#[test]
fn validation_display_joins_messages() {
    let errors = vec![
        ParameterError {
            parameter: "prompt".into(),
            message: "prompt is required".into(),
        },
        ParameterError {
            parameter: "duration".into(),
            message: "duration must be at most 10".into(),
        },
    ];
    let err = ReelgateError::Validation(errors);
    assert_eq!(
        err.to_string(),
        "invalid parameters: prompt is required; duration must be at most 10"
    );
}

#[test]
fn error_kind_display() {
    assert_eq!(ErrorKind::TransientUpstream.to_string(), "transient_upstream");
    assert_eq!(ErrorKind::RateLimit.to_string(), "rate_limit");
}

#[test]
fn json_errors_convert() {
    let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: ReelgateError = parse.into();
    assert!(matches!(err, ReelgateError::Json(_)));
}
