//! Chat completions over `POST /chat/completions`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{OpenAIConfig, describe_error_response, describe_send_error};
use crate::chat::{ChatMessage, ChatModel};
use crate::error::{RagError, Result};

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// A [`ChatModel`] backed by the OpenAI chat completions API.
///
/// Defaults: `gpt-4o`, temperature `0.7`, at most 1000 completion tokens.
pub struct OpenAIChatModel {
    client: reqwest::Client,
    config: OpenAIConfig,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIChatModel {
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = config.http_client()?;
        Ok(Self {
            client,
            config,
            model: DEFAULT_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn fail(&self, message: String) -> RagError {
        RagError::AnswerGeneration { model: self.model.clone(), message }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(model = %self.model, message_count = messages.len(), "requesting chat completion");

        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "chat request failed");
                self.fail(describe_send_error(&e, self.config.timeout))
            })?;

        if !response.status().is_success() {
            let message = describe_error_response(response).await;
            error!(model = %self.model, %message, "chat API error");
            return Err(self.fail(message));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse chat response");
            self.fail(format!("failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| self.fail("response contained no message content".into()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn model(server: &MockServer) -> OpenAIChatModel {
        OpenAIChatModel::new(OpenAIConfig::new("sk-test").with_base_url(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hi" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Hello there." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = model(&server)
            .complete(&[ChatMessage::system("be brief"), ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(reply, "Hello there.");
    }

    #[tokio::test]
    async fn missing_content_is_an_answer_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = model(&server).complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, RagError::AnswerGeneration { ref model, .. } if model == "gpt-4o"));
    }

    #[tokio::test]
    async fn server_error_is_an_answer_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = model(&server).complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("upstream exploded"));
    }
}
