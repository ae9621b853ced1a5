use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use super::{LlmAdapter, Message};

/// Deterministic adapter that returns a fixed response and records every
/// call it receives. Intended for tests — integrators who want to exercise
/// this crate without making real API calls.
pub struct FakeLlmAdapter {
    response: String,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub system: String,
}

impl FakeLlmAdapter {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("fake adapter lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("fake adapter lock poisoned").len()
    }
}

#[async_trait]
impl LlmAdapter for FakeLlmAdapter {
    async fn call(&self, messages: &[Message], system: &str) -> Result<String> {
        self.calls.lock().expect("fake adapter lock poisoned").push(RecordedCall {
            messages: messages.to_vec(),
            system: system.to_string(),
        });
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_and_returns_fixed_response() {
        let fake = FakeLlmAdapter::new("🟢 all good");
        let result = fake.call(&[Message::user("hi")], "sys").await.unwrap();
        assert_eq!(result, "🟢 all good");
        assert_eq!(fake.call_count(), 1);
        assert_eq!(fake.calls()[0].system, "sys");
    }
}
