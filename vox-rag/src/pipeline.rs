//! Voice RAG pipeline orchestrator.
//!
//! The [`VoiceRagPipeline`] ties together ingestion (parse → chunk → embed →
//! store) and question answering (search → compose → narrate), composing a
//! [`VectorIndex`], an [`AnswerComposer`], and a [`Narrator`].
//!
//! # Example
//!
//! ```rust,ignore
//! use vox_rag::{RagConfig, VoiceRagPipeline, InMemoryVectorStore};
//!
//! let pipeline = VoiceRagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chat_model(Arc::new(chat))
//!     .speech_synthesizer(Arc::new(tts))
//!     .build()?;
//!
//! pipeline.ensure_collection().await?;
//! pipeline.ingest_file("guide.pdf", "guide.pdf").await?;
//! let result = pipeline.answer_query("How do I install it?", Some("coral")).await;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::chat::ChatModel;
use crate::chunking::{Chunker, RecursiveChunker};
use crate::composer::AnswerComposer;
use crate::config::RagConfig;
use crate::document::{QueryResult, QueryStatus};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::ingest::{DocumentIngestor, load_document};
use crate::narrator::Narrator;
use crate::speech::{SpeechSynthesizer, Voice};
use crate::vectorstore::VectorStore;

/// Summary of one ingested file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub file_name: String,
    pub pages: usize,
    pub chunks: usize,
}

/// A successful answer, as returned by [`VoiceRagPipeline::try_answer_query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub audio_path: PathBuf,
    /// De-duplicated source names in retrieval order.
    pub sources: Vec<String>,
}

impl From<Answer> for QueryResult {
    fn from(answer: Answer) -> Self {
        Self {
            text_response: answer.text,
            audio_path: Some(answer.audio_path),
            sources: answer.sources,
            status: QueryStatus::Success,
        }
    }
}

/// The voice RAG pipeline.
///
/// Holds no per-query state, so one instance can serve concurrent
/// questions. Construct one via [`VoiceRagPipeline::builder()`].
pub struct VoiceRagPipeline {
    config: RagConfig,
    ingestor: DocumentIngestor,
    index: VectorIndex,
    composer: AnswerComposer,
    narrator: Narrator,
}

impl VoiceRagPipeline {
    /// Create a new [`VoiceRagPipelineBuilder`].
    pub fn builder() -> VoiceRagPipelineBuilder {
        VoiceRagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Create the configured collection if it is missing.
    pub async fn ensure_collection(&self) -> Result<()> {
        self.index.ensure_collection().await.inspect_err(|e| {
            error!(collection = %self.config.collection_name, error = %e, "failed to ensure collection");
        })
    }

    /// Parse, chunk, embed, and store one file.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DocumentParse`] if the file cannot be read, or the
    /// embedding/store error if indexing fails. Nothing is stored on error.
    #[instrument(skip_all, fields(file = %path.as_ref().display()))]
    pub async fn ingest_file(
        &self,
        path: impl AsRef<Path>,
        display_name: impl Into<String>,
    ) -> Result<IngestReport> {
        let document = load_document(path.as_ref(), display_name).await?;
        let chunks = self.ingestor.ingest_document(&document);
        let stored = self.index.store(&chunks).await?;

        let report = IngestReport {
            file_name: document.display_name,
            pages: document.pages.len(),
            chunks: stored,
        };
        info!(file_name = %report.file_name, pages = report.pages, chunks = report.chunks, "ingested document");
        Ok(report)
    }

    /// Answer `question`, narrating with `voice` or the configured default.
    ///
    /// Never fails: any error is reported through [`QueryResult::status`]
    /// with every other field empty.
    pub async fn answer_query(&self, question: &str, voice: Option<&str>) -> QueryResult {
        match self.try_answer_query(question, voice).await {
            Ok(answer) => answer.into(),
            Err(e) => {
                error!(error = %e, "query failed");
                QueryResult::failure(&e)
            }
        }
    }

    /// The same flow as [`answer_query`](Self::answer_query), as a `Result`.
    ///
    /// Steps run strictly in sequence: search, compose, narrate. The voice is
    /// validated before any external call.
    #[instrument(skip_all, fields(question_len = question.len()))]
    pub async fn try_answer_query(&self, question: &str, voice: Option<&str>) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::InvalidInput("question must not be empty".to_string()));
        }
        let voice = match voice {
            Some(name) => name.parse::<Voice>()?,
            None => self.config.default_voice,
        };

        let matches = self.index.search(question, self.config.top_k).await?;
        let text = self.composer.compose(question, &matches).await?;
        let audio_path = self.narrator.narrate(&text, voice).await?;

        let mut sources: Vec<String> = Vec::with_capacity(matches.len());
        for m in matches {
            if !sources.contains(&m.source) {
                sources.push(m.source);
            }
        }

        info!(source_count = sources.len(), %voice, "answered query");
        Ok(Answer { text, audio_path, sources })
    }
}

/// Builder for constructing a [`VoiceRagPipeline`].
///
/// The embedding provider, vector store, chat model and speech synthesizer
/// are required. Without a config, [`RagConfig::default()`] is used; without
/// a chunker, a [`RecursiveChunker`] sized from the config is used.
#[derive(Default)]
pub struct VoiceRagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chat_model: Option<Arc<dyn ChatModel>>,
    speech_synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl VoiceRagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    pub fn speech_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech_synthesizer = Some(synthesizer);
        self
    }

    /// Override the chunking strategy.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`VoiceRagPipeline`], validating that all required fields
    /// are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required component is missing or
    /// the configuration is invalid.
    pub fn build(self) -> Result<VoiceRagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chat_model =
            self.chat_model.ok_or_else(|| RagError::Config("chat_model is required".to_string()))?;
        let speech_synthesizer = self
            .speech_synthesizer
            .ok_or_else(|| RagError::Config("speech_synthesizer is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
        });

        let index = VectorIndex::new(vector_store, embedding_provider, config.collection_name.clone())
            .with_top_k(config.top_k)
            .with_similarity_threshold(config.similarity_threshold)
            .with_request_timeout(config.request_timeout);
        let composer = AnswerComposer::new(chat_model).with_timeout(config.request_timeout);
        let narrator = Narrator::new(speech_synthesizer)
            .with_audio_dir(config.audio_dir.clone())
            .with_file_prefix(config.audio_file_prefix.clone())
            .with_instructions(config.narration_instructions.clone())
            .with_timeout(config.request_timeout);

        Ok(VoiceRagPipeline {
            ingestor: DocumentIngestor::new(chunker),
            config,
            index,
            composer,
            narrator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory::InMemoryVectorStore;

    #[test]
    fn missing_components_are_reported() {
        let err = VoiceRagPipeline::builder()
            .vector_store(Arc::new(InMemoryVectorStore::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RagError::Config(ref m) if m.contains("embedding_provider")));
    }

    #[test]
    fn answer_converts_to_successful_result() {
        let result: QueryResult = Answer {
            text: "Paris.".into(),
            audio_path: PathBuf::from("/tmp/a.mp3"),
            sources: vec!["france.txt".into()],
        }
        .into();
        assert!(result.is_success());
        assert_eq!(result.status.to_string(), "success");
        assert_eq!(result.audio_path.as_deref(), Some(Path::new("/tmp/a.mp3")));
    }
}
