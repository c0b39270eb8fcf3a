//! Chat completion trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single message of a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// A hosted chat completion model.
///
/// One call is one request; implementations do not retry.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send `messages` and return the assistant's text reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Model name used in logs and error messages.
    fn name(&self) -> &str;
}
