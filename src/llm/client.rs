//! OpenAI-compatible chat-completions client.
//!
//! Perplexity exposes the same `/chat/completions` surface as OpenAI, so one
//! client serves any provider entry whose `api_base` speaks that protocol.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use super::http::send_with_retry;
use super::{ChatMessage, Completion, CompletionClient, LlmError};
use crate::providers::ProviderSettings;

/// Transport-level ceiling; tool timeouts are usually shorter.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Longest error body kept in an error message
const ERROR_BODY_LIMIT: usize = 500;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client bound to one provider's base URL and API key
pub struct OpenAiCompatClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl OpenAiCompatClient {
    pub fn new(api_base: &str, api_key: impl Into<String>) -> Result<Self, LlmError> {
        // A base without a trailing slash would have its last segment replaced by join().
        let base = format!("{}/", api_base.trim_end_matches('/'));
        let endpoint = Url::parse(&base)
            .and_then(|b| b.join("chat/completions"))
            .map_err(|e| LlmError::Transport(format!("invalid api_base {}: {}", api_base, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("echo-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn from_settings(
        settings: &ProviderSettings,
        api_key: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Self::new(&settings.api_base, api_key)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<Completion, LlmError> {
        let body = ChatCompletionRequest {
            model,
            messages: &messages,
        };

        debug!("POST {} (model {})", self.endpoint, model);

        let response = send_with_retry(|| {
            self.client
                .post(self.endpoint.clone())
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            error!("Completion request failed: {} {}", status, body);
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?
            .message
            .content
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyCompletion);
        }

        Ok(Completion { response: content })
    }
}
