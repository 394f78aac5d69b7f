//! Mapping helpers between chunks, vectors, and retrieval context.

use crate::{
    qdrant::compute_chunk_hash,
    vector_store::{EmbeddedChunk, ScoredChunk},
};
use std::collections::HashSet;

/// Chunk text with associated hash ready for embedding.
#[derive(Debug, Clone)]
pub(crate) struct PreparedChunk {
    /// Chunk text content.
    pub(crate) text: String,
    /// Stable digest used for dedupe.
    pub(crate) chunk_hash: String,
}

/// Remove blank and duplicate chunks within a document, keeping the first occurrence.
pub(crate) fn dedupe_chunks(chunks: Vec<String>) -> (Vec<PreparedChunk>, usize) {
    let mut seen = HashSet::new();
    let mut prepared = Vec::new();
    let mut skipped = 0;

    for text in chunks {
        if text.trim().is_empty() {
            continue;
        }
        let hash = compute_chunk_hash(&text);
        if seen.insert(hash.clone()) {
            prepared.push(PreparedChunk {
                text,
                chunk_hash: hash,
            });
        } else {
            skipped += 1;
        }
    }

    (prepared, skipped)
}

/// Pair prepared chunks with their vectors, in order.
pub(crate) fn attach_vectors(
    chunks: Vec<PreparedChunk>,
    vectors: Vec<Vec<f32>>,
) -> Vec<EmbeddedChunk> {
    chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| EmbeddedChunk {
            text: chunk.text,
            chunk_hash: chunk.chunk_hash,
            vector,
        })
        .collect()
}

/// Join retrieved chunks, best first, into one context block.
pub(crate) fn join_context(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .map(|hit| hit.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_chunks_removes_duplicates_and_counts_skips() {
        let chunks = vec![
            "alpha".to_string(),
            "  ".to_string(),
            "beta".to_string(),
            "alpha".to_string(),
        ];
        let (deduped, skipped) = dedupe_chunks(chunks);
        let texts: Vec<_> = deduped.iter().map(|chunk| chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha", "beta"]);
        assert_eq!(skipped, 1);
        assert_ne!(deduped[0].chunk_hash, deduped[1].chunk_hash);
    }

    #[test]
    fn join_context_keeps_rank_order() {
        let hits = vec![
            ScoredChunk {
                text: "best".into(),
                chunk_index: 4,
                score: 0.9,
            },
            ScoredChunk {
                text: "next".into(),
                chunk_index: 1,
                score: 0.5,
            },
        ];
        assert_eq!(join_context(&hits), "best\n\nnext");
    }

    #[test]
    fn attach_vectors_pairs_in_order() {
        let (prepared, _) = dedupe_chunks(vec!["a".into(), "b".into()]);
        let embedded = attach_vectors(prepared, vec![vec![1.0], vec![2.0]]);
        assert_eq!(embedded[1].text, "b");
        assert_eq!(embedded[1].vector, vec![2.0]);
    }
}
