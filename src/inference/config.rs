//! Provider configuration and fallback chain resolution.
//!
//! The `providers` and `fallback_chain` sections of `config/ridechat.yaml`.
//! The chain is the single source of truth for which endpoints are tried and
//! in what order.

use std::collections::HashMap;

use serde::Deserialize;

use super::errors::InferenceError;

/// Sentinel chain entry: fall back to the canned reply for the active style.
pub const STATIC_RESPONSE: &str = "static_response";

/// A single completion provider's runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub display_name: String,
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    /// Bearer token. Usually `${SOME_API_KEY}` in the YAML file.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Total per-call HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    150
}
fn default_timeout_secs() -> u64 {
    30
}

/// Provider registry plus the order in which providers are tried.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub fallback_chain: Vec<String>,
}

/// The resolved chain: remote providers in order, and whether the canned
/// reply closes it.
#[derive(Debug, Clone)]
pub struct ResolvedChain {
    pub providers: Vec<(String, ProviderConfig)>,
    pub static_fallback: bool,
}

/// Walk `fallback_chain` and look every key up in `providers`.
///
/// An unknown key is a config error. Duplicate keys are tried once.
pub fn resolve_chain(config: &ProvidersConfig) -> Result<ResolvedChain, InferenceError> {
    let mut providers = Vec::new();
    let mut static_fallback = false;

    for key in &config.fallback_chain {
        if key == STATIC_RESPONSE {
            static_fallback = true;
            continue;
        }
        if providers.iter().any(|(k, _)| k == key) {
            continue;
        }
        let provider = config
            .providers
            .get(key)
            .ok_or_else(|| InferenceError::ConfigError {
                reason: format!("fallback chain names unknown provider '{key}'"),
            })?;
        providers.push((key.clone(), provider.clone()));
    }

    if providers.is_empty() && !static_fallback {
        return Err(InferenceError::ConfigError {
            reason: "fallback chain is empty".into(),
        });
    }

    Ok(ResolvedChain {
        providers,
        static_fallback,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
