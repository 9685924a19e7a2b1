//! Chat-completion clients for the LLM-backed tools.
//!
//! Tools only see the [`CompletionClient`] trait; startup decides which
//! implementation backs it.

mod client;
mod http;

pub use client::OpenAiCompatClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Completion text returned by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub response: String,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response shape: {0}")]
    InvalidResponse(String),
    #[error("provider returned an empty completion")]
    EmptyCompletion,
}

/// Anything that can turn a list of messages into a completion
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, model: &str, messages: Vec<ChatMessage>)
        -> Result<Completion, LlmError>;
}

pub type SharedCompletionClient = Arc<dyn CompletionClient>;
