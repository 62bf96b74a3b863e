//! Completion providers.
//!
//! `CompletionProvider` is the seam the fallback chain iterates over.
//! `HttpProvider` is the OpenAI-compatible implementation used in production;
//! tests plug in stubs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::config::ProviderConfig;
use super::errors::InferenceError;
use super::types::{
    extract_error_message, parse_completion_body, ChatCompletionRequest, CompletionRequest,
};

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A single external text-completion endpoint.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider key used in logs and in aggregated errors.
    fn name(&self) -> &str;

    /// Produce a reply, or fail. Called at most once per turn.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, InferenceError>;
}

// ─── HttpProvider ────────────────────────────────────────────────────────────

/// OpenAI-compatible chat completions endpoint.
pub struct HttpProvider {
    key: String,
    http: HttpClient,
    config: ProviderConfig,
}

impl HttpProvider {
    /// Build the provider and its HTTP client. Does NOT check connectivity.
    pub fn new(key: impl Into<String>, config: ProviderConfig) -> Result<Self, InferenceError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::ConnectionFailed {
                endpoint: config.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            key: key.into(),
            http,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// The configured display name, e.g. `"OpenAI"`.
    pub fn display_name(&self) -> &str {
        &self.config.display_name
    }
}

#[async_trait]
impl CompletionProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.key
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, InferenceError> {
        let url = self.endpoint();
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: request.messages(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(
            provider = %self.key,
            url = %url,
            model = %body.model,
            max_tokens = body.max_tokens,
            "completion request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout {
                        duration_secs: self.config.timeout_secs,
                    }
                } else {
                    InferenceError::ConnectionFailed {
                        endpoint: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| InferenceError::MalformedResponse {
            reason: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body: extract_error_message(&body_text),
            });
        }

        parse_completion_body(&body_text)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
