//! Helpers for constructing and hashing chunk payloads.

use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Build the payload stored alongside each indexed chunk.
pub(crate) fn build_chunk_payload(
    document_id: i64,
    chunk_index: usize,
    text: &str,
    chunk_hash: &str,
    indexed_at: &str,
) -> Value {
    json!({
        "document_id": document_id,
        "chunk_index": chunk_index,
        "text": text,
        "chunk_hash": chunk_hash,
        "indexed_at": indexed_at,
    })
}

/// Compute a deterministic SHA-256 hash for the supplied text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Construct a point identifier accepted by Qdrant.
pub(crate) fn generate_point_id() -> String {
    Uuid::new_v4().to_string()
}
