//! Retrieval-augmented context: chunk, embed, index, and search documents.

use super::{
    chunking::{ChunkingOptions, chunk_text},
    mappers::{attach_vectors, dedupe_chunks, join_context},
    sanitize::truncate_chars,
    types::{ProcessingError, RetrievedContext},
};
use crate::{
    embedding::{EmbeddingClient, EmbeddingClientError},
    vector_store::{EmbeddedChunk, VectorStore},
};
use std::sync::Arc;

/// Characters of document text used when retrieval finds nothing.
pub const FALLBACK_CONTEXT_CHARS: usize = 3_000;
const EMBEDDING_BATCH_SIZE: usize = 64;

/// Builds and queries per-document chunk indexes.
#[derive(Clone)]
pub struct DocumentIndexer {
    embedding: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    chunking: ChunkingOptions,
    top_k: usize,
}

impl DocumentIndexer {
    /// Create an indexer splitting with `chunking` and retrieving `top_k` chunks per query.
    pub fn new(
        embedding: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        chunking: ChunkingOptions,
        top_k: usize,
    ) -> Self {
        Self {
            embedding,
            store,
            chunking,
            top_k: top_k.max(1),
        }
    }

    /// Chunk `text`, drop blank and duplicate chunks, and embed the rest.
    pub async fn create_document_embeddings(
        &self,
        text: &str,
    ) -> Result<Vec<EmbeddedChunk>, ProcessingError> {
        let chunks = chunk_text(text, &self.chunking)?;
        let (prepared, skipped_duplicates) = dedupe_chunks(chunks);
        if prepared.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = prepared.iter().map(|chunk| chunk.text.clone()).collect();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBEDDING_BATCH_SIZE) {
            vectors.extend(self.embedding.generate_embeddings(batch.to_vec()).await?);
        }
        if vectors.len() != prepared.len() {
            return Err(EmbeddingClientError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                prepared.len(),
                vectors.len()
            ))
            .into());
        }

        tracing::debug!(
            chunks = prepared.len(),
            skipped_duplicates,
            "Document embeddings created"
        );
        Ok(attach_vectors(prepared, vectors))
    }

    /// Store embedded chunks under `document_id`, replacing any previous ones.
    pub async fn index_document(
        &self,
        document_id: i64,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<usize, ProcessingError> {
        let written = self.store.upsert_document(document_id, chunks).await?;
        tracing::info!(document_id, chunks = written, "Document indexed");
        Ok(written)
    }

    /// Embed and index `text` under `document_id`.
    pub async fn rebuild(&self, document_id: i64, text: &str) -> Result<usize, ProcessingError> {
        let chunks = self.create_document_embeddings(text).await?;
        self.index_document(document_id, chunks).await
    }

    /// Index `text` unless chunks for `document_id` already exist; returns chunks written.
    pub async fn ensure_indexed(
        &self,
        document_id: i64,
        text: &str,
    ) -> Result<usize, ProcessingError> {
        if self.store.contains_document(document_id).await? {
            return Ok(0);
        }
        self.rebuild(document_id, text).await
    }

    /// Drop the chunks of `document_id`.
    pub async fn remove_document(&self, document_id: i64) -> Result<(), ProcessingError> {
        Ok(self.store.remove_document(document_id).await?)
    }

    /// Retrieve the chunks of `document_id` closest to `query`, joined by blank lines.
    ///
    /// Falls back to the first [`FALLBACK_CONTEXT_CHARS`] characters of `full_text` when nothing
    /// is retrieved.
    pub async fn perform_document_search(
        &self,
        document_id: i64,
        query: &str,
        full_text: &str,
    ) -> Result<RetrievedContext, ProcessingError> {
        let mut vectors = self
            .embedding
            .generate_embeddings(vec![query.to_string()])
            .await?;
        let vector = vectors.pop().ok_or_else(|| {
            EmbeddingClientError::InvalidResponse("no vector returned for the query".into())
        })?;

        let hits = self.store.search(document_id, &vector, self.top_k).await?;
        if hits.is_empty() {
            return Ok(fallback_context(full_text));
        }

        Ok(RetrievedContext {
            context: join_context(&hits),
            chunks: hits.len(),
            used_fallback: false,
        })
    }
}

/// Leading document text used when retrieval is unavailable.
pub fn fallback_context(full_text: &str) -> RetrievedContext {
    RetrievedContext {
        context: truncate_chars(full_text, FALLBACK_CONTEXT_CHARS).to_string(),
        chunks: 0,
        used_fallback: true,
    }
}
