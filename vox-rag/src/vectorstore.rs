//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{IndexedVector, ScoredVector};
use crate::error::Result;

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage named collections of [`IndexedVector`]s. Every
/// vector in a collection has the dimensionality the collection was created
/// with. Backends are responsible for their own internal concurrency control;
/// callers share them behind an `Arc` without extra locking.
///
/// # Example
///
/// ```rust,ignore
/// use vox_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", 384).await?;
/// store.upsert("docs", &vectors).await?;
/// let hits = store.search("docs", &query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Whether a collection with this name exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Insert or replace vectors in a collection as a single write.
    async fn upsert(&self, collection: &str, vectors: &[IndexedVector]) -> Result<()>;

    /// Search for the `top_k` most similar vectors to the given embedding.
    ///
    /// Returns results ordered by descending cosine similarity.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredVector>>;

    /// Number of vectors stored in a collection.
    async fn count(&self, collection: &str) -> Result<u64>;

    /// Backend name used in logs and error messages.
    fn name(&self) -> &str;
}
