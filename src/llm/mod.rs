//! LLM adapter trait and the concrete adapters the memory pipeline can talk
//! to. The observation journal only ever needs a single `call`, but the
//! trait mirrors `localgpt::agent::providers::LLMProvider`'s streaming
//! default-fallback shape for anyone wiring this crate into something that
//! wants token-by-token output.

mod anthropic;
mod fake;
mod openai;

pub use anthropic::AnthropicAdapter;
pub use fake::FakeLlmAdapter;
pub use openai::OpenAiAdapter;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Minimal interface an LLM backend must satisfy to drive the Observer and
/// Reflector.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Send `messages` with an optional `system` prompt, return the full
    /// response text.
    async fn call(&self, messages: &[Message], system: &str) -> Result<String>;

    /// Stream response text chunks. Default falls back to wrapping `call`'s
    /// result in a single-item stream.
    async fn stream(&self, messages: &[Message], system: &str) -> Result<BoxStream<'_, Result<String>>> {
        let text = self.call(messages, system).await?;
        Ok(Box::pin(stream::once(async move { Ok(text) })))
    }
}
