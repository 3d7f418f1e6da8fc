//! Error classification into user-facing messages.
//!
//! Raw error text (ours or the provider's) is matched case-insensitively
//! against an ordered rule list; the first matching rule wins.

use crate::ReelgateError;

/// Shown when nothing better is known.
pub const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please try again.";

pub const POLLING_TIMEOUT_MESSAGE: &str =
    "Video generation is taking longer than expected. Please check back later.";
pub const NETWORK_MESSAGE: &str = "Network error. Please check your connection and try again.";
pub const AUTH_MESSAGE: &str = "Invalid API key. Please check your Replicate API key configuration.";
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please wait a moment and try again.";
pub const TIMEOUT_MESSAGE: &str = "The request took too long. Please try again.";

/// Messages at or above this many characters are replaced by the generic one.
const MAX_PASSTHROUGH_CHARS: usize = 200;

enum Outcome {
    Fixed(&'static str),
    Original,
}

/// Ordered rules: `(needles, outcome)`.
const RULES: &[(&[&str], Outcome)] = &[
    (&["polling timeout"], Outcome::Fixed(POLLING_TIMEOUT_MESSAGE)),
    (
        &["network", "fetch", "connection", "failed to fetch"],
        Outcome::Fixed(NETWORK_MESSAGE),
    ),
    (
        &["api key", "authentication", "unauthorized", "401"],
        Outcome::Fixed(AUTH_MESSAGE),
    ),
    (
        &["rate limit", "too many requests", "429", "quota"],
        Outcome::Fixed(RATE_LIMIT_MESSAGE),
    ),
    (
        &["invalid", "validation", "required", "missing"],
        Outcome::Original,
    ),
    (&["timeout", "timed out"], Outcome::Fixed(TIMEOUT_MESSAGE)),
];

/// Map raw error text into an actionable message.
pub fn classify_message(message: Option<&str>) -> String {
    let Some(message) = message.filter(|m| !m.is_empty()) else {
        return GENERIC_MESSAGE.to_string();
    };
    let lower = message.to_lowercase();

    for (needles, outcome) in RULES {
        if needles.iter().any(|needle| lower.contains(needle)) {
            return match outcome {
                Outcome::Fixed(text) => (*text).to_string(),
                Outcome::Original => message.to_string(),
            };
        }
    }

    if message.chars().count() < MAX_PASSTHROUGH_CHARS {
        message.to_string()
    } else {
        GENERIC_MESSAGE.to_string()
    }
}

/// Classify an error by its display text.
pub fn classify(error: &ReelgateError) -> String {
    classify_message(Some(&error.to_string()))
}
