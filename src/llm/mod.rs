//! Completion client trait and types.
//!
//! The [`CompletionClient`] trait is the seam between the request handlers and
//! the external completion endpoint: it takes the recent conversation turns
//! and returns a single assistant reply, or a typed failure. The production
//! implementation is [`ChatCompletionsClient`]; tests substitute scripted
//! clients through the same trait.

pub mod chat_completions;

pub use chat_completions::ChatCompletionsClient;

/// Number of trailing messages forwarded to the completion endpoint.
pub const CONTEXT_WINDOW: usize = 10;

/// LLM connection and model settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the completion API (e.g., `https://api.groq.com/openai`).
    pub base_url: String,
    /// Optional API key for bearer authentication.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `llama-3.1-8b-instant`).
    pub model: String,
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

/// A single `{role, content}` conversation turn as sent over the wire.
///
/// Turns carry no timestamps; they are the projection of stored messages
/// that the completion endpoint understands.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Turn {
    /// Role of the turn's author.
    pub role: MessageRole,
    /// Text content of the turn.
    pub content: String,
}

/// Errors from the completion endpoint.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The HTTP request failed outright (connect error, timeout, bad URL).
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("completion endpoint returned {status}: {message}")]
    Endpoint {
        /// HTTP status code from the endpoint.
        status: u16,
        /// Response body, best effort.
        message: String,
    },

    /// The response parsed but carried no assistant text.
    #[error("completion response missing message content")]
    MissingContent,
}

/// Trait for completion clients.
///
/// Implementations send the given turns to a completion endpoint and return
/// the assistant's reply text.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request a single assistant reply for the given conversation turns.
    ///
    /// # Errors
    ///
    /// Returns a [`CompletionError`] if the request fails, the endpoint
    /// rejects it, or the response carries no content.
    async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionError>;
}
