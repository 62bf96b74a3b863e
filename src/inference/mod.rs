//! Completion providers: OpenAI-compatible chat completion clients.
//!
//! This module handles all communication with the external text-generation
//! APIs:
//! - Request building and response parsing (`types`)
//! - The `CompletionProvider` seam and its HTTP implementation (`provider`)
//! - Ordered fallback across providers, ending in a canned reply (`client`)
//! - Provider configuration and chain resolution (`config`)
//! - Reply styles: system preambles and static texts (`style`)
//!
//! Every provider speaks the OpenAI Chat Completions API, so swapping the
//! primary for the secondary is a config change, not a code change.

pub mod client;
pub mod config;
pub mod errors;
pub mod provider;
pub mod style;
pub mod types;

// Re-exports for convenience
pub use client::{Completion, CompletionSource, ProviderChain};
pub use config::{ProviderConfig, ProvidersConfig};
pub use errors::{InferenceError, ProviderFailure};
pub use provider::{CompletionProvider, HttpProvider};
pub use style::Style;
pub use types::{ChatMessage, CompletionRequest, Role};
