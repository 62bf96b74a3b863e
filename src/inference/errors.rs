//! Inference error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Structured logging
//! is the caller's responsibility. These types carry the context needed to
//! build meaningful log entries.

use thiserror::Error;

/// A single provider's failure, kept so the chain can report every attempt
/// when no provider produced a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Provider key from the config (e.g., `"openai"`).
    pub provider: String,
    /// Rendered error message of the failed attempt.
    pub message: String,
}

/// Errors that can occur while talking to completion providers.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// TCP/HTTP connection to the provider endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The provider did not respond within the configured timeout.
    #[error("request timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Non-2xx HTTP response from the provider endpoint.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The provider answered 2xx but with an `{"error": {"message"}}` payload.
    #[error("provider error: {message}")]
    ApiError { message: String },

    /// The body could not be parsed as a chat completion.
    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },

    /// `choices[0].message.content` was missing or empty.
    #[error("empty completion content")]
    EmptyResponse,

    /// Every remote provider in the fallback chain failed.
    #[error("all providers failed: {}", render_failures(.failures))]
    AllProvidersFailed { failures: Vec<ProviderFailure> },

    /// Configuration loading or validation error.
    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

fn render_failures(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no providers configured".to_string();
    }
    failures
        .iter()
        .map(|f| format!("{}: {}", f.provider, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl InferenceError {
    /// Whether this is the terminal "nothing answered" error.
    pub fn is_total_outage(&self) -> bool {
        matches!(self, InferenceError::AllProvidersFailed { .. })
    }
}

impl From<serde_yaml::Error> for InferenceError {
    fn from(e: serde_yaml::Error) -> Self {
        InferenceError::ConfigError {
            reason: format!("failed to parse config: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_providers_failed_lists_every_message() {
        let err = InferenceError::AllProvidersFailed {
            failures: vec![
                ProviderFailure {
                    provider: "openai".into(),
                    message: "HTTP 500: upstream down".into(),
                },
                ProviderFailure {
                    provider: "groq".into(),
                    message: "connection failed to http://x: refused".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("openai: HTTP 500: upstream down"));
        assert!(msg.contains("groq: connection failed"));
        assert!(err.is_total_outage());
    }

    #[test]
    fn test_all_providers_failed_empty() {
        let err = InferenceError::AllProvidersFailed { failures: vec![] };
        assert_eq!(err.to_string(), "all providers failed: no providers configured");
    }

    #[test]
    fn test_http_error_is_not_total_outage() {
        let err = InferenceError::HttpError {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 429: rate limited");
        assert!(!err.is_total_outage());
    }
}
