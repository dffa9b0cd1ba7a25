//! OpenAI Chat Completions API client.
//!
//! Implements [`CompletionClient`] against `/v1/chat/completions`,
//! non-streaming, with fixed sampling parameters and a bounded request
//! timeout.

use std::time::Duration;

use super::{CompletionClient, CompletionError, LlmSettings, Turn};

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1024;
const TOP_P: f64 = 1.0;

/// Client for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsClient {
    /// Create a new client with the given settings and request timeout.
    ///
    /// The timeout covers the whole completion call; expiry surfaces as
    /// [`CompletionError::Transport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(settings: LlmSettings, timeout: Duration) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, settings })
    }
}

#[async_trait::async_trait]
impl CompletionClient for ChatCompletionsClient {
    async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model": self.settings.model,
            "messages": turns,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "top_p": TOP_P,
            "stream": false,
            "stop": serde_json::Value::Null,
        });

        let mut rb = self.http.post(&url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        tracing::debug!(
            model = %self.settings.model,
            turn_count = turns.len(),
            "Requesting completion"
        );

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %message, "Completion endpoint error");
            return Err(CompletionError::Endpoint {
                status: status.as_u16(),
                message,
            });
        }

        let v: serde_json::Value = resp.json().await?;
        let content = v["choices"][0]["message"]["content"]
            .as_str()
            .map(ToString::to_string)
            .ok_or(CompletionError::MissingContent)?;

        tracing::debug!(reply_length = content.len(), "Completion received");
        Ok(content)
    }
}
