//! AI provider abstraction.
//!
//! The handler layer talks to a single capability: turn a conversation
//! history into an assistant reply. Two implementations exist:
//!
//! - [`MockClient`]: deterministic stand-in, used when no API key is
//!   configured (the default for development and tests)
//! - [`OpenAiClient`]: real chat-completions client over HTTP
//!
//! Selection happens once at startup via [`build_client`]; the session
//! store has no dependency on which provider is active.

pub mod mock;
pub mod openai;

pub use mock::MockClient;
pub use openai::OpenAiClient;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::session::{Message, MessageRole};

/// AI connection and model settings, sourced from the environment.
#[derive(Debug, Clone)]
pub struct AiSettings {
    /// API key; when absent the deterministic mock is used.
    pub api_key: Option<String>,
    /// Model identifier (e.g. `gpt-4o-mini`).
    pub model: String,
    /// Optional base URL override for OpenAI-compatible providers.
    pub base_url: Option<String>,
    /// Application environment (e.g. `development`, `production`).
    pub app_env: String,
    /// Seed string that makes mock replies deterministic per input.
    pub mock_seed: String,
}

/// Role of a chat message sent to the provider.
///
/// Unlike [`MessageRole`], this includes `System` for the optional
/// context instruction prepended by the chat handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instruction.
    System,
    /// User question.
    User,
    /// Assistant answer.
    Assistant,
}

impl From<MessageRole> for ChatRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => Self::User,
            MessageRole::Assistant => Self::Assistant,
        }
    }
}

/// A message in the conversation context sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a system instruction message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.into(),
            content: message.content.clone(),
        }
    }
}

/// Trait for AI reply generation.
///
/// Implementations receive the ordered conversation context and return
/// the assistant reply text. Any error is translated by the handler
/// layer into an upstream-failure response; no retries happen here.
#[async_trait::async_trait]
pub trait AiClient: Send + Sync {
    /// Generate an assistant reply for the given conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    async fn generate_reply(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
}

/// Select the AI client for this process.
///
/// A real client is returned iff an API key is configured; otherwise the
/// deterministic mock is used so the service runs without external calls.
#[must_use]
pub fn build_client(settings: &AiSettings) -> Arc<dyn AiClient> {
    if settings.api_key.is_some() {
        Arc::new(OpenAiClient::new(settings.clone()))
    } else {
        Arc::new(MockClient::new(settings.mock_seed.clone(), settings.model.clone()))
    }
}
