//! Configuration for the voice RAG pipeline.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::error::{RagError, Result};
use crate::speech::Voice;

/// Default collection name in the vector store.
pub const DEFAULT_COLLECTION: &str = "tech_docs_collection";

/// Default number of matches retrieved per question.
pub const DEFAULT_TOP_K: usize = 3;

/// Default file name prefix for generated audio.
pub const DEFAULT_AUDIO_PREFIX: &str = "tech_docs_response";

/// Configuration parameters for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Maximum number of characters repeated between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of matches retrieved per question.
    pub top_k: usize,
    /// Voice used when the caller does not pick one.
    pub default_voice: Voice,
    /// Vector store collection holding the chunks.
    pub collection_name: String,
    /// Optional minimum similarity; `None` keeps every hit.
    pub similarity_threshold: Option<f32>,
    /// Upper bound for each external call.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// Scratch directory for generated audio files.
    pub audio_dir: PathBuf,
    /// File name prefix for generated audio.
    pub audio_file_prefix: String,
    /// Delivery instructions passed to the speech model.
    pub narration_instructions: Option<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            default_voice: Voice::default(),
            collection_name: DEFAULT_COLLECTION.to_string(),
            similarity_threshold: None,
            request_timeout: Duration::from_secs(60),
            audio_dir: std::env::temp_dir(),
            audio_file_prefix: DEFAULT_AUDIO_PREFIX.to_string(),
            narration_instructions: None,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `collection_name` or `audio_file_prefix` is blank
    /// - `request_timeout` is zero
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.collection_name.trim().is_empty() {
            return Err(RagError::Config("collection_name must not be empty".to_string()));
        }
        if self.audio_file_prefix.trim().is_empty() {
            return Err(RagError::Config("audio_file_prefix must not be empty".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(RagError::Config("request_timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of matches retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn default_voice(mut self, voice: Voice) -> Self {
        self.config.default_voice = voice;
        self
    }

    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    /// Drop hits scoring below `threshold`.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn audio_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.audio_dir = dir.into();
        self
    }

    pub fn audio_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.audio_file_prefix = prefix.into();
        self
    }

    pub fn narration_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.narration_instructions = Some(instructions.into());
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
