//! Deterministic mock AI client.
//!
//! Used whenever no API key is configured, so the service (and its test
//! suite) runs without external calls. Replies are stable for a given
//! seed, model, and conversation.

use sha2::{Digest, Sha256};

use super::{AiClient, ChatMessage, ChatRole};

/// Deterministic stand-in for a real AI provider.
#[derive(Debug, Clone)]
pub struct MockClient {
    seed: String,
    model: String,
}

impl MockClient {
    /// Create a mock client with the given seed and model name.
    #[must_use]
    pub fn new(seed: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            model: model.into(),
        }
    }

    /// Short digest binding the reply to seed, model, and conversation.
    fn digest(&self, messages: &[ChatMessage]) -> String {
        let payload = serde_json::json!({
            "seed": self.seed,
            "model": self.model,
            "messages": messages,
        });
        let mut hasher = Sha256::new();
        hasher.update(payload.to_string().as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..6])
    }

    /// Last user message, truncated for a brief echo.
    fn summarize_question(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.trim().chars().take(160).collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl AiClient for MockClient {
    async fn generate_reply(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let digest = self.digest(messages);
        let brief = Self::summarize_question(messages);
        let hint = if brief.is_empty() {
            String::new()
        } else {
            format!(" Q=\"{brief}\"")
        };
        Ok(format!(
            "[MockAnswer:{digest}] This is a simulated response for testing.{hint}"
        ))
    }
}
