//! Data types for documents, chunks, indexed vectors, and query results.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::RagError;

/// Metadata key holding the display name of the source document.
pub const META_FILE_NAME: &str = "file_name";
/// Metadata key holding the 1-based page number the chunk came from.
pub const META_PAGE_NUMBER: &str = "page_number";
/// Metadata key holding the RFC 3339 ingestion timestamp.
pub const META_TIMESTAMP: &str = "timestamp";
/// Metadata key holding the source type tag (`pdf`, `text`, `markdown`).
pub const META_SOURCE_TYPE: &str = "source_type";
/// Metadata key holding the chunk's position within its page.
pub const META_CHUNK_INDEX: &str = "chunk_index";
/// Metadata key holding the chunk's character offset within its page.
pub const META_START_INDEX: &str = "start_index";

/// Source name reported for matches whose payload lacks a file name.
pub const UNKNOWN_SOURCE: &str = "Unknown Source";

/// The format a document was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Pdf,
    Text,
    Markdown,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Markdown => "markdown",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage {
    /// 1-based page number.
    pub number: u32,
    pub text: String,
}

/// A parsed document, split into pages but not yet chunked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Name shown to users and recorded as the chunk's `file_name`.
    pub display_name: String,
    pub source_type: SourceType,
    pub pages: Vec<SourcePage>,
}

impl SourceDocument {
    /// A single-page document, handy for text sources and tests.
    pub fn single_page(
        display_name: impl Into<String>,
        source_type: SourceType,
        text: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            source_type,
            pages: vec![SourcePage { number: 1, text: text.into() }],
        }
    }
}

/// A contiguous span of source text plus provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    /// The chunk's text.
    pub content: String,
    /// String metadata inherited from the source page plus chunk position.
    pub metadata: HashMap<String, String>,
}

/// A stored embedding together with its chunk payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedVector {
    /// Collision-free identifier (UUID v4).
    pub id: String,
    /// Embedding of `chunk.content`.
    pub embedding: Vec<f32>,
    /// The opaque payload.
    pub chunk: DocumentChunk,
}

/// A stored vector returned by a similarity search, with its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredVector {
    pub vector: IndexedVector,
    /// Cosine similarity (higher is more relevant).
    pub score: f32,
}

/// Read-only view of a search hit, as consumed by the answer composer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedMatch {
    pub content: String,
    pub source: String,
    /// Page number, `0` when absent or non-numeric.
    pub page: u32,
    pub score: f32,
}

impl From<ScoredVector> for RetrievedMatch {
    fn from(hit: ScoredVector) -> Self {
        let ScoredVector { vector, score } = hit;
        let mut metadata = vector.chunk.metadata;
        let source = metadata.remove(META_FILE_NAME).unwrap_or_else(|| UNKNOWN_SOURCE.to_string());
        let page = metadata
            .get(META_PAGE_NUMBER)
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(0);
        Self { content: vector.chunk.content, source, page, score }
    }
}

/// Outcome of one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum QueryStatus {
    Success,
    Error(String),
}

impl QueryStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

impl From<QueryStatus> for String {
    fn from(status: QueryStatus) -> Self {
        status.to_string()
    }
}

impl From<String> for QueryStatus {
    fn from(value: String) -> Self {
        if value == "success" {
            return Self::Success;
        }
        let message = value.strip_prefix("error: ").unwrap_or(&value);
        Self::Error(message.to_string())
    }
}

/// The end-to-end result of answering one question.
///
/// On failure every field except `status` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub text_response: String,
    /// Generated MP3; the caller owns and eventually removes it.
    pub audio_path: Option<PathBuf>,
    /// De-duplicated source names in retrieval order.
    pub sources: Vec<String>,
    pub status: QueryStatus,
}

impl QueryResult {
    pub fn failure(err: &RagError) -> Self {
        Self {
            text_response: String::new(),
            audio_path: None,
            sources: Vec::new(),
            status: QueryStatus::Error(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
