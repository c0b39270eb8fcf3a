//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector store
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and single-process sessions.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{IndexedVector, ScoredVector};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

#[derive(Debug)]
struct Collection {
    dimensions: usize,
    vectors: HashMap<String, IndexedVector>,
}

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are stored as nested `HashMap`s: collection name → vector ID → vector.
/// All operations are async-safe via `tokio::sync::RwLock`; searches take a
/// read lock, so concurrent queries never block each other.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn store_error(message: String) -> RagError {
    RagError::VectorStore { backend: BACKEND.to_string(), message }
}

fn missing(collection: &str) -> RagError {
    store_error(format!("collection '{collection}' does not exist"))
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            debug!(collection = name, "collection already exists, skipping creation");
            return Ok(());
        }
        collections.insert(name.to_string(), Collection { dimensions, vectors: HashMap::new() });
        debug!(collection = name, dimensions, "created in-memory collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, vectors: &[IndexedVector]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;

        // Validate everything before touching the map so a bad batch writes nothing.
        if let Some(bad) = vectors.iter().find(|v| v.embedding.len() != store.dimensions) {
            return Err(store_error(format!(
                "vector '{}' has {} dimensions, collection '{collection}' expects {}",
                bad.id,
                bad.embedding.len(),
                store.dimensions
            )));
        }

        for vector in vectors {
            store.vectors.insert(vector.id.clone(), vector.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredVector>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;

        if embedding.len() != store.dimensions {
            return Err(store_error(format!(
                "query has {} dimensions, collection '{collection}' expects {}",
                embedding.len(),
                store.dimensions
            )));
        }

        let mut scored: Vec<(f32, &IndexedVector)> = store
            .vectors
            .values()
            .map(|vector| (cosine_similarity(&vector.embedding, embedding), vector))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);
        Ok(scored
            .into_iter()
            .map(|(score, vector)| ScoredVector { score, vector: vector.clone() })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        Ok(store.vectors.len() as u64)
    }

    fn name(&self) -> &str {
        BACKEND
    }
}
