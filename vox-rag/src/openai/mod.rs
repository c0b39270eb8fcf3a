//! OpenAI-backed embedding, chat, and speech clients.
//!
//! This module is only available when the `openai` feature is enabled. All
//! three clients call the REST API directly with `reqwest` and share one
//! [`OpenAIConfig`]. A custom `base_url` points them at any
//! OpenAI-compatible endpoint.

mod chat;
mod embedding;
mod speech;

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{RagError, Result};

pub use chat::OpenAIChatModel;
pub use embedding::OpenAIEmbeddingProvider;
pub use speech::OpenAISpeechSynthesizer;

/// The default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings shared by the OpenAI clients.
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAIConfig {
    /// Settings for the public API with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), base_url: DEFAULT_BASE_URL.to_string(), timeout: DEFAULT_TIMEOUT }
    }

    /// Read `OPENAI_API_KEY` and, if set, `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| RagError::Config("OPENAI_API_KEY environment variable not set".into()))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        if self.api_key.trim().is_empty() {
            return Err(RagError::Config("OpenAI API key must not be empty".into()));
        }
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| RagError::Config(format!("failed to build HTTP client: {e}")))
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Describe a transport failure, calling out timeouts explicitly.
fn describe_send_error(e: &reqwest::Error, timeout: Duration) -> String {
    if e.is_timeout() {
        format!("request timed out after {timeout:?}")
    } else {
        format!("request failed: {e}")
    }
}

/// Describe a non-success response using the API's error message when present.
async fn describe_error_response(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail =
        serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
    format!("API returned {status}: {detail}")
}
