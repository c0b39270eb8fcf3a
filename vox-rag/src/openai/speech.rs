//! Text-to-speech over `POST /audio/speech`.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use super::{OpenAIConfig, describe_error_response, describe_send_error};
use crate::error::{RagError, Result};
use crate::speech::{SpeechRequest, SpeechSynthesizer};

const DEFAULT_MODEL: &str = "gpt-4o-mini-tts";

/// A [`SpeechSynthesizer`] backed by the OpenAI speech API, returning MP3.
pub struct OpenAISpeechSynthesizer {
    client: reqwest::Client,
    config: OpenAIConfig,
    model: String,
}

impl OpenAISpeechSynthesizer {
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = config.http_client()?;
        Ok(Self { client, config, model: DEFAULT_MODEL.into() })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
}

#[async_trait]
impl SpeechSynthesizer for OpenAISpeechSynthesizer {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        debug!(model = %self.model, voice = %request.voice, text_len = request.text.len(), "synthesizing speech");

        let body = SpeechBody {
            model: &self.model,
            voice: request.voice.as_str(),
            input: &request.text,
            response_format: "mp3",
            instructions: request.instructions.as_deref(),
        };

        let response = self
            .client
            .post(self.config.endpoint("audio/speech"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "speech request failed");
                RagError::AudioGeneration(describe_send_error(&e, self.config.timeout))
            })?;

        if !response.status().is_success() {
            let message = describe_error_response(response).await;
            error!(model = %self.model, %message, "speech API error");
            return Err(RagError::AudioGeneration(message));
        }

        let bytes = response.bytes().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to read audio body");
            RagError::AudioGeneration(format!("failed to read audio body: {e}"))
        })?;
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        &self.model
    }
}
