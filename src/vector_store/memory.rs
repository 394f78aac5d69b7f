//! Exact in-process index: one flat L2 table per document.

use super::{EmbeddedChunk, ScoredChunk, VectorStore, VectorStoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct FlatIndex {
    dimension: usize,
    texts: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

/// Vector store kept in process memory; contents are lost on restart.
#[derive(Default)]
pub struct InMemoryVectorStore {
    indexes: RwLock<HashMap<i64, FlatIndex>>,
}

impl InMemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert_document(
        &self,
        document_id: i64,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<usize, VectorStoreError> {
        let mut indexes = self.indexes.write().await;
        if chunks.is_empty() {
            indexes.remove(&document_id);
            return Ok(0);
        }

        let dimension = chunks[0].vector.len();
        if let Some(bad) = chunks.iter().find(|chunk| chunk.vector.len() != dimension) {
            return Err(VectorStoreError::DimensionMismatch {
                expected: dimension,
                actual: bad.vector.len(),
            });
        }

        let count = chunks.len();
        let (texts, vectors): (Vec<String>, Vec<Vec<f32>>) = chunks
            .into_iter()
            .map(|chunk| (chunk.text, chunk.vector))
            .unzip();
        indexes.insert(
            document_id,
            FlatIndex {
                dimension,
                texts,
                vectors,
            },
        );
        Ok(count)
    }

    async fn search(
        &self,
        document_id: i64,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, VectorStoreError> {
        let indexes = self.indexes.read().await;
        let Some(index) = indexes.get(&document_id) else {
            return Ok(Vec::new());
        };
        if vector.len() != index.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: index.dimension,
                actual: vector.len(),
            });
        }

        let mut ranked: Vec<(usize, f32)> = index
            .vectors
            .iter()
            .enumerate()
            .map(|(position, candidate)| (position, squared_l2(vector, candidate)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(position, distance)| ScoredChunk {
                text: index.texts[position].clone(),
                chunk_index: position,
                score: 1.0 / (1.0 + distance),
            })
            .collect())
    }

    async fn contains_document(&self, document_id: i64) -> Result<bool, VectorStoreError> {
        Ok(self.indexes.read().await.contains_key(&document_id))
    }

    async fn remove_document(&self, document_id: i64) -> Result<(), VectorStoreError> {
        self.indexes.write().await.remove(&document_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, vector: &[f32]) -> EmbeddedChunk {
        EmbeddedChunk {
            text: text.into(),
            chunk_hash: crate::qdrant::compute_chunk_hash(text),
            vector: vector.to_vec(),
        }
    }

    #[tokio::test]
    async fn search_orders_by_distance_and_caps_at_chunk_count() {
        let store = InMemoryVectorStore::new();
        store
            .upsert_document(
                1,
                vec![
                    chunk("far", &[0.0, 1.0]),
                    chunk("near", &[1.0, 0.0]),
                    chunk("middle", &[0.7, 0.7]),
                ],
            )
            .await
            .expect("upsert");

        let hits = store.search(1, &[1.0, 0.0], 10).await.expect("search");
        let texts: Vec<_> = hits.iter().map(|hit| hit.text.as_str()).collect();
        assert_eq!(texts, vec!["near", "middle", "far"]);
        assert!((hits[0].score - 1.0).abs() < f32::EPSILON);
        assert_eq!(hits[0].chunk_index, 1);
    }

    #[tokio::test]
    async fn documents_are_isolated_and_removable() {
        let store = InMemoryVectorStore::new();
        store
            .upsert_document(1, vec![chunk("one", &[1.0])])
            .await
            .expect("upsert");
        assert!(store.contains_document(1).await.expect("contains"));
        assert!(!store.contains_document(2).await.expect("contains"));
        assert!(store.search(2, &[1.0], 3).await.expect("search").is_empty());

        store.remove_document(1).await.expect("remove");
        assert!(!store.contains_document(1).await.expect("contains"));
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let store = InMemoryVectorStore::new();
        let error = store
            .upsert_document(1, vec![chunk("a", &[1.0, 0.0]), chunk("b", &[1.0])])
            .await
            .expect_err("mismatch");
        assert!(matches!(error, VectorStoreError::DimensionMismatch { .. }));

        store
            .upsert_document(1, vec![chunk("a", &[1.0, 0.0])])
            .await
            .expect("upsert");
        assert!(store.search(1, &[1.0], 1).await.is_err());
    }
}
