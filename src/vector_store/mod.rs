//! Per-document similarity index over chunk embeddings.

mod memory;
mod qdrant_store;

use crate::config::{VectorStoreKind, get_config};
use crate::qdrant::QdrantError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub use memory::InMemoryVectorStore;
pub use qdrant_store::QdrantVectorStore;

/// Errors raised by vector store backends.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// Vector length differs from the vectors already indexed.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the indexed vectors.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
    /// Backend is misconfigured.
    #[error("Vector store misconfigured: {0}")]
    Configuration(String),
    /// Qdrant request failed.
    #[error(transparent)]
    Qdrant(#[from] QdrantError),
}

/// Chunk text paired with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    /// Chunk text.
    pub text: String,
    /// SHA-256 digest of the text.
    pub chunk_hash: String,
    /// Embedding vector.
    pub vector: Vec<f32>,
}

/// Chunk returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    /// Chunk text.
    pub text: String,
    /// Position of the chunk within its document.
    pub chunk_index: usize,
    /// Similarity score; higher is closer.
    pub score: f32,
}

/// Storage for per-document chunk vectors.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace the indexed chunks of `document_id`; returns how many were written.
    async fn upsert_document(
        &self,
        document_id: i64,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<usize, VectorStoreError>;

    /// Return up to `limit` chunks of `document_id` nearest to `vector`, best first.
    async fn search(
        &self,
        document_id: i64,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, VectorStoreError>;

    /// Whether any chunks are indexed for `document_id`.
    async fn contains_document(&self, document_id: i64) -> Result<bool, VectorStoreError>;

    /// Drop every chunk of `document_id`.
    async fn remove_document(&self, document_id: i64) -> Result<(), VectorStoreError>;
}

/// Build the configured vector store backend.
pub async fn build_vector_store() -> Result<Arc<dyn VectorStore>, VectorStoreError> {
    let config = get_config();
    match config.vector_store {
        VectorStoreKind::Memory => {
            tracing::info!("Using in-memory vector store");
            Ok(Arc::new(InMemoryVectorStore::new()))
        }
        VectorStoreKind::Qdrant => {
            let url = config.qdrant_url.as_deref().ok_or_else(|| {
                VectorStoreError::Configuration("QDRANT_URL is not set".into())
            })?;
            let store = QdrantVectorStore::connect(
                url,
                config.qdrant_api_key.clone(),
                config.qdrant_collection_name.clone(),
                config.embedding_dimension as u64,
            )
            .await?;
            tracing::info!(collection = %config.qdrant_collection_name, "Using Qdrant vector store");
            Ok(Arc::new(store))
        }
    }
}
