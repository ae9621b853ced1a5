use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use super::{LlmAdapter, Message, Role};

/// Thin `reqwest`-backed client for OpenAI-compatible chat completion APIs.
pub struct OpenAiAdapter {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiAdapter {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn format_messages(&self, messages: &[Message], system: &str) -> Vec<Value> {
        let mut formatted = Vec::with_capacity(messages.len() + 1);
        if !system.is_empty() {
            formatted.push(json!({ "role": "system", "content": system }));
        }
        for m in messages {
            let role = match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            formatted.push(json!({ "role": role, "content": m.content }));
        }
        formatted
    }
}

#[async_trait]
impl LlmAdapter for OpenAiAdapter {
    async fn call(&self, messages: &[Message], system: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": self.format_messages(messages, system),
        });

        debug!(model = %self.model, "sending OpenAI request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to send OpenAI request")?;

        let body: Value = response.json().await.context("failed to decode OpenAI response")?;

        if let Some(error) = body.get("error") {
            anyhow::bail!("OpenAI API error: {}", error);
        }

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .context("no message content in OpenAI response")
    }
}
