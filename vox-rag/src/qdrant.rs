//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//! Each point's payload holds the chunk text under `content` with every
//! metadata entry flattened alongside it.
//!
//! # Example
//!
//! ```rust,ignore
//! use vox_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::with_api_key("https://xyz.cloud.qdrant.io:6334", Some(key))?;
//! store.create_collection("tech_docs_collection", 1536).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::debug;

use crate::document::{DocumentChunk, IndexedVector, ScoredVector};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "qdrant";
const CONTENT_KEY: &str = "content";

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Collections are created with cosine distance.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Connect to the given URL without authentication.
    pub fn new(url: &str) -> Result<Self> {
        Self::with_api_key(url, None)
    }

    /// Connect to the given URL, authenticating with `api_key` when present.
    pub fn with_api_key(url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Qdrant::from_url(url).api_key(api_key).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    /// Create a new Qdrant vector store with default URL (`http://localhost:6334`).
    pub fn default_url() -> Result<Self> {
        Self::new("http://localhost:6334")
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStore { backend: BACKEND.to_string(), message: e.to_string() }
    }

    /// Read a scalar payload value as a string.
    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            Some(Kind::IntegerValue(i)) => Some(i.to_string()),
            Some(Kind::DoubleValue(d)) => Some(d.to_string()),
            Some(Kind::BoolValue(b)) => Some(b.to_string()),
            _ => None,
        }
    }

    fn to_point(vector: &IndexedVector) -> Result<PointStruct> {
        let mut payload_map = serde_json::Map::new();
        for (key, value) in &vector.chunk.metadata {
            payload_map.insert(key.clone(), serde_json::Value::String(value.clone()));
        }
        payload_map.insert(
            CONTENT_KEY.to_string(),
            serde_json::Value::String(vector.chunk.content.clone()),
        );

        let payload =
            Payload::try_from(serde_json::Value::Object(payload_map)).map_err(Self::map_err)?;
        Ok(PointStruct::new(vector.id.clone(), vector.embedding.clone(), payload))
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.client.collection_exists(name).await.map_err(Self::map_err)
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        if self.collection_exists(name).await? {
            debug!(collection = name, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, vectors: &[IndexedVector]) -> Result<()> {
        if vectors.is_empty() {
            return Ok(());
        }

        let points = vectors.iter().map(Self::to_point).collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = vectors.len(), "upserted points to qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredVector>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, embedding.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let results = response
            .result
            .into_iter()
            .map(|scored| {
                let id = scored
                    .id
                    .as_ref()
                    .and_then(|pid| match &pid.point_id_options {
                        Some(PointIdOptions::Uuid(s)) => Some(s.clone()),
                        Some(PointIdOptions::Num(n)) => Some(n.to_string()),
                        None => None,
                    })
                    .unwrap_or_default();

                let mut content = String::new();
                let mut metadata = HashMap::new();
                for (key, value) in &scored.payload {
                    let Some(text) = Self::extract_string(value) else { continue };
                    if key == CONTENT_KEY {
                        content = text;
                    } else {
                        metadata.insert(key.clone(), text);
                    }
                }

                ScoredVector {
                    vector: IndexedVector {
                        id,
                        embedding: Vec::new(),
                        chunk: DocumentChunk { content, metadata },
                    },
                    score: scored.score,
                }
            })
            .collect();

        Ok(results)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(Self::map_err)?;
        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    fn name(&self) -> &str {
        BACKEND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_string_accepts_scalars() {
        let s = QdrantValue { kind: Some(Kind::StringValue("3".into())) };
        let i = QdrantValue { kind: Some(Kind::IntegerValue(3)) };
        let none = QdrantValue { kind: None };
        assert_eq!(QdrantVectorStore::extract_string(&s).as_deref(), Some("3"));
        assert_eq!(QdrantVectorStore::extract_string(&i).as_deref(), Some("3"));
        assert_eq!(QdrantVectorStore::extract_string(&none), None);
    }

    #[test]
    fn point_payload_flattens_metadata() {
        let vector = IndexedVector {
            id: "6f1c2a34-1d5e-4d1e-9a36-0f0c4f4b8a11".into(),
            embedding: vec![0.1, 0.2],
            chunk: DocumentChunk {
                content: "The capital of France is Paris.".into(),
                metadata: HashMap::from([("file_name".to_string(), "france.txt".to_string())]),
            },
        };

        let point = QdrantVectorStore::to_point(&vector).unwrap();
        assert_eq!(
            point.payload.get(CONTENT_KEY).and_then(QdrantVectorStore::extract_string).as_deref(),
            Some("The capital of France is Paris.")
        );
        assert_eq!(
            point.payload.get("file_name").and_then(QdrantVectorStore::extract_string).as_deref(),
            Some("france.txt")
        );
    }
}
