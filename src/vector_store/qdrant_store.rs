//! Remote backend storing every document's chunks in one Qdrant collection.

use super::{EmbeddedChunk, ScoredChunk, VectorStore, VectorStoreError};
use crate::qdrant::{PointInsert, QdrantService};
use async_trait::async_trait;
use serde_json::Value;

/// Vector store backed by a Qdrant collection (cosine distance).
pub struct QdrantVectorStore {
    service: QdrantService,
    collection: String,
}

impl QdrantVectorStore {
    /// Connect and ensure the collection and its payload indexes exist.
    pub async fn connect(
        url: &str,
        api_key: Option<String>,
        collection: String,
        vector_size: u64,
    ) -> Result<Self, VectorStoreError> {
        let service = QdrantService::new(url, api_key)?;
        service
            .create_collection_if_not_exists(&collection, vector_size)
            .await?;
        service.ensure_payload_indexes(&collection).await?;
        Ok(Self {
            service,
            collection,
        })
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn upsert_document(
        &self,
        document_id: i64,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<usize, VectorStoreError> {
        self.service
            .delete_document_points(&self.collection, document_id)
            .await?;
        let points = chunks
            .into_iter()
            .enumerate()
            .map(|(chunk_index, chunk)| PointInsert {
                text: chunk.text,
                chunk_index,
                chunk_hash: chunk.chunk_hash,
                vector: chunk.vector,
            })
            .collect();
        Ok(self
            .service
            .upsert_document_points(&self.collection, document_id, points)
            .await?)
    }

    async fn search(
        &self,
        document_id: i64,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, VectorStoreError> {
        let points = self
            .service
            .search_document_points(&self.collection, document_id, vector.to_vec(), limit)
            .await?;
        Ok(points
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload?;
                let text = payload.get("text").and_then(Value::as_str)?.to_string();
                let chunk_index = payload
                    .get("chunk_index")
                    .and_then(Value::as_u64)
                    .unwrap_or_default() as usize;
                Some(ScoredChunk {
                    text,
                    chunk_index,
                    score: point.score,
                })
            })
            .collect())
    }

    async fn contains_document(&self, document_id: i64) -> Result<bool, VectorStoreError> {
        Ok(self
            .service
            .count_document_points(&self.collection, document_id)
            .await?
            > 0)
    }

    async fn remove_document(&self, document_id: i64) -> Result<(), VectorStoreError> {
        Ok(self
            .service
            .delete_document_points(&self.collection, document_id)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{GET, POST, PUT},
        MockServer,
    };
    use serde_json::json;

    async fn connected(server: &MockServer) -> QdrantVectorStore {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/collections/docs");
                then.status(200).json_body(json!({ "status": "ok" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/docs/index");
                then.status(200).json_body(json!({ "status": "ok" }));
            })
            .await;
        QdrantVectorStore::connect(&server.base_url(), None, "docs".into(), 2)
            .await
            .expect("connect")
    }

    #[tokio::test]
    async fn search_maps_payload_text_and_skips_payloadless_points() {
        let server = MockServer::start_async().await;
        let store = connected(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/docs/points/query");
                then.status(200).json_body(json!({
                    "result": [
                        { "id": 1, "score": 0.8, "payload": { "text": "Term is 12 months.", "chunk_index": 3 } },
                        { "id": 2, "score": 0.5 }
                    ]
                }));
            })
            .await;

        let hits = store.search(5, &[0.1, 0.9], 3).await.expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "Term is 12 months.");
        assert_eq!(hits[0].chunk_index, 3);
    }

    #[tokio::test]
    async fn upsert_replaces_previous_document_points() {
        let server = MockServer::start_async().await;
        let store = connected(&server).await;
        let delete = server
            .mock_async(|when, then| {
                when.method(POST).path("/collections/docs/points/delete");
                then.status(200).json_body(json!({ "status": "ok" }));
            })
            .await;
        let upsert = server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/docs/points");
                then.status(200).json_body(json!({ "status": "ok" }));
            })
            .await;

        let written = store
            .upsert_document(
                5,
                vec![EmbeddedChunk {
                    text: "Clause".into(),
                    chunk_hash: "h".into(),
                    vector: vec![1.0, 0.0],
                }],
            )
            .await
            .expect("upsert");

        delete.assert();
        upsert.assert();
        assert_eq!(written, 1);
    }
}
