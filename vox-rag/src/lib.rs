//! # vox-rag
//!
//! Retrieval-augmented question answering over technical documents, with
//! answers narrated to MP3.
//!
//! Documents are split by a [`RecursiveChunker`], embedded through an
//! [`EmbeddingProvider`], and stored in a [`VectorStore`]. A question is
//! answered by a [`VoiceRagPipeline`]: similarity search, one grounded chat
//! completion, and one speech synthesis call. Failures never escape
//! [`VoiceRagPipeline::answer_query`]; they are reported in the
//! [`QueryResult`] status.
//!
//! ## Features
//!
//! | Feature  | What it enables                                            |
//! |----------|------------------------------------------------------------|
//! | `openai` | OpenAI embedding, chat, and speech clients via reqwest     |
//! | `qdrant` | `QdrantVectorStore` via qdrant-client                      |
//! | `pdf`    | PDF text extraction via lopdf                              |
//! | `full`   | All of the above                                           |
//!
//! `openai` and `pdf` are enabled by default.

pub mod chat;
pub mod chunking;
pub mod composer;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod inmemory;
pub mod narrator;
pub mod pipeline;
pub mod speech;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chat::{ChatMessage, ChatModel, ChatRole};
pub use chunking::{Chunker, RecursiveChunker, TextSpan};
pub use composer::AnswerComposer;
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    DocumentChunk, IndexedVector, QueryResult, QueryStatus, RetrievedMatch, ScoredVector,
    SourceDocument, SourcePage, SourceType,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use index::VectorIndex;
pub use ingest::{DocumentIngestor, load_document};
pub use inmemory::InMemoryVectorStore;
pub use narrator::Narrator;
pub use pipeline::{Answer, IngestReport, VoiceRagPipeline, VoiceRagPipelineBuilder};
pub use speech::{SpeechRequest, SpeechSynthesizer, Voice};
pub use vectorstore::VectorStore;

#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIConfig, OpenAIEmbeddingProvider, OpenAISpeechSynthesizer};
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
