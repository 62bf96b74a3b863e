//! Completion provider chain.
//!
//! Tries each configured provider once, in order, and returns the first
//! usable reply. When every remote provider has failed, the chain either
//! answers with the canned text for the requested style (if the config ends
//! with `static_response`) or reports every failure at once.

use super::config::{resolve_chain, ProvidersConfig};
use super::errors::{InferenceError, ProviderFailure};
use super::provider::{CompletionProvider, HttpProvider};
use super::style::Style;
use super::types::CompletionRequest;

// ─── Completion ──────────────────────────────────────────────────────────────

/// Where a reply came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionSource {
    /// A remote provider, by key.
    Provider(String),
    /// The canned reply for the style.
    Static,
}

/// A reply from the chain plus everything that failed before it.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub source: CompletionSource,
    /// Providers that were tried and failed before this reply.
    pub failures: Vec<ProviderFailure>,
}

// ─── ProviderChain ───────────────────────────────────────────────────────────

/// Ordered list of completion providers with an optional static fallback.
pub struct ProviderChain {
    providers: Vec<Box<dyn CompletionProvider>>,
    static_fallback: bool,
}

impl ProviderChain {
    /// Build the chain from the `providers` / `fallback_chain` config.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self, InferenceError> {
        let resolved = resolve_chain(config)?;
        let mut providers: Vec<Box<dyn CompletionProvider>> = Vec::new();
        for (key, provider) in resolved.providers {
            if provider.api_key.is_empty() {
                tracing::warn!(provider = %key, "provider has no api key configured");
            }
            providers.push(Box::new(HttpProvider::new(key, provider)?));
        }
        Ok(Self {
            providers,
            static_fallback: resolved.static_fallback,
        })
    }

    /// Build a chain from already-constructed providers.
    pub fn new(providers: Vec<Box<dyn CompletionProvider>>, static_fallback: bool) -> Self {
        Self {
            providers,
            static_fallback,
        }
    }

    /// Provider keys in the order they are tried.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Whether the canned reply closes the chain.
    pub fn has_static_fallback(&self) -> bool {
        self.static_fallback
    }

    /// Generate a reply: remote providers first, then the canned reply.
    ///
    /// Errors only when every remote provider failed and the chain has no
    /// static fallback.
    pub async fn generate_response(
        &self,
        prompt: &str,
        style: Style,
    ) -> Result<String, InferenceError> {
        self.generate(prompt, style).await.map(|c| c.content)
    }

    /// Like [`generate_response`](Self::generate_response), keeping the
    /// source of the reply and the failures before it.
    pub async fn generate(&self, prompt: &str, style: Style) -> Result<Completion, InferenceError> {
        match self.try_providers(prompt, style).await {
            Ok(completion) => Ok(completion),
            Err(failures) if self.static_fallback => {
                tracing::warn!(
                    attempted = failures.len(),
                    style = ?style,
                    "all providers failed, using static response"
                );
                Ok(Completion {
                    content: static_fallback_response(style).to_string(),
                    source: CompletionSource::Static,
                    failures,
                })
            }
            Err(failures) => Err(InferenceError::AllProvidersFailed { failures }),
        }
    }

    /// Remote providers only. The error carries every provider's failure.
    pub async fn complete(&self, prompt: &str, style: Style) -> Result<String, InferenceError> {
        self.try_providers(prompt, style)
            .await
            .map(|c| c.content)
            .map_err(|failures| InferenceError::AllProvidersFailed { failures })
    }

    /// Try each provider exactly once, sequentially. No retries.
    async fn try_providers(
        &self,
        prompt: &str,
        style: Style,
    ) -> Result<Completion, Vec<ProviderFailure>> {
        let request = CompletionRequest {
            system: style.system_preamble(),
            user: prompt.to_string(),
        };

        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.complete(&request).await {
                Ok(content) => {
                    tracing::info!(
                        provider = %provider.name(),
                        failed_before = failures.len(),
                        "completion succeeded"
                    );
                    return Ok(Completion {
                        content,
                        source: CompletionSource::Provider(provider.name().to_string()),
                        failures,
                    });
                }
                Err(e) => {
                    tracing::warn!(provider = %provider.name(), error = %e, "provider failed, falling back");
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        Err(failures)
    }
}

// ─── Static Response Fallback ────────────────────────────────────────────────

/// The reply used when all providers are unavailable.
pub fn static_fallback_response(style: Style) -> &'static str {
    style.static_response()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
