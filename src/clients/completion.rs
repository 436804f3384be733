//! OpenAI-compatible chat completion client (OpenRouter by default).

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;
use crate::error::SapError;

/// Result of a completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Text of the first choice.
    pub content: String,
    /// Usage block exactly as returned by the provider, if any.
    pub usage: Option<serde_json::Value>,
}

/// Client for `POST {base}/chat/completions`.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl CompletionClient {
    /// Creates a client from configuration and a shared HTTP client.
    #[must_use]
    pub fn new(client: Client, config: &CompletionConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
        }
    }

    /// Sends `prompt` as a single user message to `model`.
    ///
    /// # Errors
    ///
    /// - [`SapError::Completion`] if no API key is configured, the request
    ///   fails, the provider answers with a non-success status, or the body
    ///   is not valid JSON.
    /// - [`SapError::EmptyCompletion`] if the response has no choices.
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<Completion, SapError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SapError::Completion("completion API key not configured".into()))?;

        let body = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        tracing::debug!(model, "sending completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SapError::Completion(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SapError::Completion(format!(
                "provider returned {status}: {error_body}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| SapError::Completion(format!("invalid response body: {e}")))?;

        let usage = chat.usage;
        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or(SapError::EmptyCompletion)?;

        Ok(Completion {
            content: choice.message.content,
            usage,
        })
    }
}
