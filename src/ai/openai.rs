//! OpenAI chat-completions client.
//!
//! Non-streaming wrapper around `/v1/chat/completions`, compatible with
//! any OpenAI-style provider via the base URL override.

use anyhow::Context;

use super::{AiClient, AiSettings, ChatMessage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Real AI client backed by an OpenAI-compatible HTTP API.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    settings: AiSettings,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.settings.model)
            .field("base_url", &self.settings.base_url)
            .finish()
    }
}

impl OpenAiClient {
    /// Create a new client with the given settings.
    #[must_use]
    pub fn new(settings: AiSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn chat_url(&self) -> String {
        let base = self
            .settings
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{base}/v1/chat/completions")
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        serde_json::json!({
            "model": self.settings.model,
            "messages": messages,
            "temperature": 0.2,
        })
    }
}

#[async_trait::async_trait]
impl AiClient for OpenAiClient {
    async fn generate_reply(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let mut rb = self.http.post(self.chat_url()).json(&self.request_body(messages));
        if let Some(key) = &self.settings.api_key {
            rb = rb.bearer_auth(key);
        }

        let resp = rb
            .send()
            .await
            .context("chat completions request failed")?
            .error_for_status()
            .context("chat completions returned error status")?;

        let body: serde_json::Value = resp
            .json()
            .await
            .context("chat completions response was not JSON")?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .context("chat completions response missing content")?
            .trim()
            .to_string();

        Ok(content)
    }
}
