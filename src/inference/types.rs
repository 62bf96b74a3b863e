//! Shared types for the completion providers.
//!
//! These mirror the OpenAI Chat Completions API types, used for both
//! request building and response parsing. Every provider in the chain
//! speaks the same wire format.

use serde::{Deserialize, Serialize};

use super::errors::InferenceError;

// ─── Request Types ───────────────────────────────────────────────────────────

/// A single message in the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// What the chain hands to a single provider: the two messages of a turn.
///
/// The provider fills in `model`, `temperature` and `max_tokens` from its own
/// config when building the wire request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

impl CompletionRequest {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

// ─── Response Parsing ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Parse a 2xx chat completion body into its reply text.
///
/// Accepts `{"choices":[{"message":{"content": ...}}]}`. An `{"error": ...}`
/// payload, an empty `choices` array, or blank content are all failures.
pub fn parse_completion_body(body: &str) -> Result<String, InferenceError> {
    let resp: CompletionBody =
        serde_json::from_str(body).map_err(|e| InferenceError::MalformedResponse {
            reason: format!("failed to parse completion body: {e}"),
        })?;

    if let Some(err) = resp.error {
        return Err(InferenceError::ApiError {
            message: err.message.unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(InferenceError::MalformedResponse {
            reason: "empty choices array".into(),
        })?;

    choice
        .message
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or(InferenceError::EmptyResponse)
}

/// Pull `error.message` out of a non-2xx body when the provider sent JSON.
///
/// Falls back to the raw body so nothing the provider said is lost.
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<CompletionBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.trim().to_string())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
