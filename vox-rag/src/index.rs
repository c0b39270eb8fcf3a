//! Embedding-backed storage and retrieval of document chunks.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::document::{DocumentChunk, IndexedVector, RetrievedMatch};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, bounded};
use crate::vectorstore::VectorStore;

/// Text embedded once to learn the provider's output dimensionality.
const PROBE_TEXT: &str = "dimension probe";

/// A named collection in a [`VectorStore`] paired with the
/// [`EmbeddingProvider`] that fills it.
///
/// Cheap to clone; clones share the same store and provider.
#[derive(Clone)]
pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    collection: String,
    top_k: usize,
    similarity_threshold: Option<f32>,
    request_timeout: Duration,
}

impl VectorIndex {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            collection: collection.into(),
            top_k: crate::config::DEFAULT_TOP_K,
            similarity_threshold: None,
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: Option<f32>) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Create the collection if it does not exist yet.
    ///
    /// The dimensionality comes from embedding a fixed probe text. Calling
    /// this repeatedly is harmless.
    pub async fn ensure_collection(&self) -> Result<()> {
        if self.bounded_store(self.store.collection_exists(&self.collection)).await? {
            debug!(collection = %self.collection, "collection already exists");
            return Ok(());
        }

        let probe = self.bounded_embed(self.embedder.embed(PROBE_TEXT)).await?;
        if probe.is_empty() {
            return Err(RagError::Embedding {
                provider: self.embedder.name().to_string(),
                message: "probe embedding is empty".to_string(),
            });
        }

        self.bounded_store(self.store.create_collection(&self.collection, probe.len())).await?;
        info!(collection = %self.collection, dimensions = probe.len(), "created collection");
        Ok(())
    }

    /// Embed and store `chunks`, returning how many were written.
    ///
    /// Every chunk is embedded before anything is written, so an embedding
    /// failure leaves the collection untouched.
    pub async fn store(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.bounded_embed(self.embedder.embed_batch(&texts)).await.inspect_err(|e| {
            error!(collection = %self.collection, error = %e, "embedding failed during store");
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::Embedding {
                provider: self.embedder.name().to_string(),
                message: format!(
                    "expected {} embeddings, provider returned {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        let vectors: Vec<IndexedVector> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedVector {
                id: Uuid::new_v4().to_string(),
                embedding,
                chunk: chunk.clone(),
            })
            .collect();

        self.bounded_store(self.store.upsert(&self.collection, &vectors)).await.inspect_err(|e| {
            error!(collection = %self.collection, error = %e, "upsert failed");
        })?;

        info!(collection = %self.collection, count = vectors.len(), "stored chunks");
        Ok(vectors.len())
    }

    /// Retrieve the `k` chunks most similar to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NoResults`] when the collection has not been
    /// created yet, when the search yields nothing, or when nothing scores at
    /// or above the configured similarity threshold.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedMatch>> {
        if !self.bounded_store(self.store.collection_exists(&self.collection)).await? {
            return Err(RagError::NoResults(format!(
                "collection '{}' has not been created yet",
                self.collection
            )));
        }

        let embedding = self.bounded_embed(self.embedder.embed(query)).await?;
        let hits =
            self.bounded_store(self.store.search(&self.collection, &embedding, k)).await?;

        if hits.is_empty() {
            return Err(RagError::NoResults(format!(
                "collection '{}' returned no matches",
                self.collection
            )));
        }

        let total = hits.len();
        let matches: Vec<RetrievedMatch> = hits
            .into_iter()
            .filter(|hit| self.similarity_threshold.is_none_or(|t| hit.score >= t))
            .map(RetrievedMatch::from)
            .collect();

        if matches.is_empty() {
            return Err(RagError::NoResults(format!(
                "none of {total} matches scored above the similarity threshold"
            )));
        }

        debug!(collection = %self.collection, result_count = matches.len(), "search completed");
        Ok(matches)
    }

    /// Number of chunks stored in the collection.
    pub async fn count(&self) -> Result<u64> {
        self.bounded_store(self.store.count(&self.collection)).await
    }

    async fn bounded_embed<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        let provider = self.embedder.name().to_string();
        bounded(self.request_timeout, fut, |limit| RagError::Embedding {
            provider,
            message: format!("timed out after {limit:?}"),
        })
        .await
    }

    async fn bounded_store<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        let backend = self.store.name().to_string();
        bounded(self.request_timeout, fut, |limit| RagError::VectorStore {
            backend,
            message: format!("timed out after {limit:?}"),
        })
        .await
    }
}
