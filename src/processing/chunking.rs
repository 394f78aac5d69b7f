//! Semantic chunking helpers.
//!
//! Documents are split twice with different budgets: long documents are cut into large pieces
//! for analysis prompts, and every document is cut into small overlapping pieces for retrieval.
//! Length is measured in characters by default; token counting (`tiktoken-rs`) is available for
//! model-aligned budgets and falls back to `cl100k_base` for unknown models.

use crate::config::ChunkLengthUnit;
use anyhow::Error as TokenizerError;
use semchunk_rs::Chunker;
use std::sync::Arc;
use tiktoken_rs::{CoreBPE, cl100k_base, get_bpe_from_model, o200k_base};

use super::types::ChunkingError;

pub(crate) type LengthCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// Chunk budget used when a long document is split for analysis prompts.
pub const ANALYSIS_CHUNK_SIZE: usize = 4000;
/// Overlap between analysis chunks.
pub const ANALYSIS_CHUNK_OVERLAP: usize = 200;

/// Splitting parameters for one chunking pass.
#[derive(Debug, Clone)]
pub struct ChunkingOptions {
    /// Hard upper bound on chunk length.
    pub chunk_size: usize,
    /// Length carried over from the previous chunk.
    pub overlap: usize,
    /// Unit used to measure length.
    pub unit: ChunkLengthUnit,
    /// Model whose tokenizer is used for [`ChunkLengthUnit::Tokens`].
    pub model: String,
}

impl ChunkingOptions {
    /// Character-measured options.
    pub fn characters(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            unit: ChunkLengthUnit::Chars,
            model: String::new(),
        }
    }
}

/// Chunk text into semantic segments.
///
/// - `chunk_size` is a hard upper bound on the measured length per segment.
/// - `overlap` prepends up to that much of the previous chunk's tail to each chunk; the result
///   still respects `chunk_size`.
///
/// Returns an empty vector when the input text is all whitespace.
pub fn chunk_text(text: &str, options: &ChunkingOptions) -> Result<Vec<String>, ChunkingError> {
    if options.chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let counter = build_length_counter(options.unit, &options.model)?;
    Ok(chunk_text_with_counter(
        text,
        options.chunk_size,
        options.overlap,
        counter,
    ))
}

/// Build the length function for the given unit.
pub(crate) fn build_length_counter(
    unit: ChunkLengthUnit,
    model: &str,
) -> Result<LengthCounter, ChunkingError> {
    match unit {
        ChunkLengthUnit::Chars => Ok(char_counter()),
        ChunkLengthUnit::Tokens => build_tiktoken_counter(model),
    }
}

fn char_counter() -> LengthCounter {
    Arc::new(|segment: &str| segment.chars().count())
}

fn build_tiktoken_counter(model: &str) -> Result<LengthCounter, ChunkingError> {
    let normalized = model.trim();
    let target = if normalized.is_empty() {
        "cl100k_base"
    } else {
        normalized
    };
    let encoding = resolve_encoding(target).map_err(|source| ChunkingError::Tokenizer {
        model: target.to_string(),
        source,
    })?;
    let encoding = Arc::new(encoding);

    Ok(Arc::new(move |segment: &str| {
        encoding.encode_ordinary(segment).len()
    }))
}

fn resolve_encoding(model: &str) -> Result<CoreBPE, TokenizerError> {
    match get_bpe_from_model(model) {
        Ok(encoding) => Ok(encoding),
        Err(model_err) => {
            tracing::debug!(
                model,
                error = %model_err,
                "Tokenizer model lookup failed; trying encoding name"
            );
            match model {
                "o200k_base" => o200k_base(),
                "cl100k_base" => cl100k_base(),
                _ => {
                    tracing::warn!(
                        model,
                        "Falling back to 'cl100k_base' encoding for length counting"
                    );
                    cl100k_base()
                }
            }
        }
    }
}

fn chunk_text_with_counter(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    counter: LengthCounter,
) -> Vec<String> {
    let counter_for_chunker = counter.clone();
    let chunker = Chunker::new(
        chunk_size,
        Box::new(move |segment: &str| counter_for_chunker.as_ref()(segment)),
    );
    let base_chunks = enforce_budget(chunker.chunk(text), chunk_size, &counter);
    apply_overlap(base_chunks, chunk_size, overlap, &counter)
}

/// Re-split any segment whose measured length is over `chunk_size`.
///
/// Segments are cut at the last whitespace inside the budget, or at the last fitting char
/// boundary when a single word is too long. Only whitespace at the cut is dropped.
fn enforce_budget(chunks: Vec<String>, chunk_size: usize, counter: &LengthCounter) -> Vec<String> {
    let mut bounded = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if counter.as_ref()(&chunk) <= chunk_size {
            bounded.push(chunk);
            continue;
        }

        let mut rest = chunk.as_str();
        while !rest.is_empty() {
            if counter.as_ref()(rest) <= chunk_size {
                bounded.push(rest.to_string());
                break;
            }
            let cut = prefix_cut_within(rest, chunk_size, counter);
            let (head, tail) = rest.split_at(cut);
            let head = head.trim_end();
            if !head.is_empty() {
                bounded.push(head.to_string());
            }
            rest = tail.trim_start();
        }
    }
    bounded
}

/// Byte offset ending the longest prefix of `text` that fits `limit`, preferring whitespace.
///
/// Always advances by at least one char so a single oversized char cannot stall splitting.
fn prefix_cut_within(text: &str, limit: usize, counter: &LengthCounter) -> usize {
    let ends: Vec<usize> = text
        .char_indices()
        .skip(1)
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let fitting = ends.partition_point(|&end| counter.as_ref()(&text[..end]) <= limit);
    let Some(&hard_end) = fitting.checked_sub(1).and_then(|index| ends.get(index)) else {
        return ends[0];
    };

    match text[..hard_end].rfind(char::is_whitespace) {
        Some(space) if !text[..space].trim().is_empty() => space,
        _ => hard_end,
    }
}

/// Prefix each chunk with a length-limited tail of its predecessor.
fn apply_overlap(
    chunks: Vec<String>,
    chunk_size: usize,
    overlap: usize,
    counter: &LengthCounter,
) -> Vec<String> {
    let effective_overlap = overlap.min(chunk_size.saturating_sub(1));
    if chunks.len() < 2 || effective_overlap == 0 {
        return chunks;
    }

    let mut overlapped = Vec::with_capacity(chunks.len());
    let mut previous: Option<String> = None;

    for current in chunks {
        let next = match previous.as_deref() {
            Some(prev) => {
                build_overlapped_chunk(prev, &current, effective_overlap, chunk_size, counter)
            }
            None => current.clone(),
        };
        overlapped.push(next);
        previous = Some(current);
    }

    overlapped
}

fn build_overlapped_chunk(
    previous: &str,
    current: &str,
    overlap: usize,
    chunk_size: usize,
    counter: &LengthCounter,
) -> String {
    let tail = longest_suffix_within(previous, overlap, counter);
    let mut combined = String::with_capacity(tail.len() + current.len() + 1);

    if !tail.is_empty() {
        combined.push_str(tail);
        if !tail.ends_with(char::is_whitespace) && !current.starts_with(char::is_whitespace) {
            combined.push(' ');
        }
    }

    combined.push_str(current);
    longest_suffix_within(&combined, chunk_size, counter).to_string()
}

/// Longest whitespace-trimmed suffix of `text` whose measured length fits `limit`.
fn longest_suffix_within<'a>(text: &'a str, limit: usize, counter: &LengthCounter) -> &'a str {
    if limit == 0 {
        return "";
    }

    let trimmed = text.trim_start();
    if counter.as_ref()(trimmed) <= limit {
        return trimmed;
    }

    for (offset, _) in text.char_indices().skip(1) {
        let candidate = text[offset..].trim_start();
        if counter.as_ref()(candidate) <= limit {
            return candidate;
        }
    }

    ""
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitespace_counter() -> LengthCounter {
        Arc::new(|segment: &str| segment.split_whitespace().count())
    }

    #[test]
    fn chunk_text_respects_chunk_size_whitespace_counter() {
        let text = "one two three four five";
        let chunks = chunk_text_with_counter(text, 2, 0, whitespace_counter());
        assert_eq!(chunks, vec!["one two", "three four", "five"]);
    }

    #[test]
    fn chunk_text_with_counter_applies_overlap() {
        let text = "one two three four five";
        let counter = whitespace_counter();
        let chunks = chunk_text_with_counter(text, 3, 1, counter.clone());
        assert_eq!(chunks, vec!["one two three", "three four five"]);
        for chunk in &chunks {
            assert!(counter.as_ref()(chunk) <= 3);
        }
    }

    #[test]
    fn chunk_text_handles_whitespace_input() {
        let chunks = chunk_text("  \n ", &ChunkingOptions::characters(10, 2)).expect("chunks");
        assert!(chunks.is_empty());
    }

    #[test]
    fn chunk_text_rejects_zero_chunk_size() {
        let error = chunk_text("hello", &ChunkingOptions::characters(0, 0)).unwrap_err();
        assert!(matches!(error, ChunkingError::InvalidChunkSize));
    }

    #[test]
    fn character_chunks_stay_within_budget() {
        let paragraph = "The tenant shall pay rent on the first day of each month. ";
        let text = paragraph.repeat(40);
        let options = ChunkingOptions::characters(200, 40);
        let chunks = chunk_text(&text, &options).expect("chunks");

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 200, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn oversized_segments_are_resplit_without_losing_words() {
        let text = "alpha beta gamma delta epsilon";
        let chunks = enforce_budget(vec![text.to_string()], 12, &char_counter());
        assert_eq!(chunks, vec!["alpha beta", "gamma delta", "epsilon"]);

        let long_word = enforce_budget(vec!["abcdefghij".to_string()], 4, &char_counter());
        assert_eq!(long_word, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn chunks_stay_within_budget_without_overlap() {
        let text = "The tenant shall pay rent on the first day of each month. ".repeat(40);
        let chunks = chunk_text(&text, &ChunkingOptions::characters(200, 0)).expect("chunks");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 200, "chunk too long: {chunk:?}");
        }
        let chunk_words: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        let original_words: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(chunk_words, original_words);
    }

    #[test]
    fn retrieval_and_analysis_presets_stay_within_budget() {
        let clauses = "Clause. ".repeat(1000);
        let retrieval = chunk_text(&clauses, &ChunkingOptions::characters(1000, 100)).expect("rag");
        assert!(retrieval.len() > 1);
        assert!(retrieval.iter().all(|chunk| chunk.chars().count() <= 1000));

        let contract = "Each party shall keep the other's confidential information secret. "
            .repeat(200);
        let analysis = chunk_text(
            &contract,
            &ChunkingOptions::characters(ANALYSIS_CHUNK_SIZE, ANALYSIS_CHUNK_OVERLAP),
        )
        .expect("analysis");
        assert!(analysis.len() > 1);
        assert!(
            analysis
                .iter()
                .all(|chunk| chunk.chars().count() <= ANALYSIS_CHUNK_SIZE)
        );
    }

    #[test]
    fn token_chunks_respect_tiktoken_budget() {
        let text = "The quick brown fox jumps over the lazy dog.";
        let options = ChunkingOptions {
            chunk_size: 5,
            overlap: 0,
            unit: ChunkLengthUnit::Tokens,
            model: "gpt-4o".into(),
        };
        let chunks = chunk_text(text, &options).expect("chunking succeeded");
        let counter = build_tiktoken_counter("gpt-4o").expect("tokenizer");
        for chunk in &chunks {
            assert!(counter.as_ref()(chunk) <= 5);
        }
        let chunk_words: Vec<&str> = chunks
            .iter()
            .flat_map(|chunk| chunk.split_whitespace())
            .collect();
        let original_words: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(chunk_words, original_words);
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let text = "§ ".repeat(300);
        let chunks = chunk_text(&text, &ChunkingOptions::characters(50, 10)).expect("chunks");
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50);
        }
    }
}
