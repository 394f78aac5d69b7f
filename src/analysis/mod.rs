//! Model-backed document analysis: summary, document type, and key information.
//!
//! Short documents are classified from their full text. Documents longer than
//! [`LONG_DOCUMENT_CHARS`] are classified from their summary instead, and key information is read
//! from the first analysis chunk only.

pub mod prompts;

use crate::{
    llm::{CompletionRequest, LlmClient, LlmClientError, parse_json_reply},
    processing::{
        chunking::{ANALYSIS_CHUNK_OVERLAP, ANALYSIS_CHUNK_SIZE, ChunkingOptions, chunk_text},
        sanitize::truncate_chars,
        types::ChunkingError,
    },
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Documents longer than this many characters take the summary-first path.
pub const LONG_DOCUMENT_CHARS: usize = 8_000;

const DEFAULT_DOCUMENT_TYPE: &str = "Legal Document";

/// Errors raised while analyzing a document.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Document contained no text to analyze.
    #[error("Document contains no text to analyze")]
    EmptyDocument,
    /// Model request failed.
    #[error(transparent)]
    Llm(#[from] LlmClientError),
    /// Long document could not be split for analysis.
    #[error(transparent)]
    Chunking(#[from] ChunkingError),
}

/// Classified document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentType {
    /// Concise label such as "Commercial Lease Agreement".
    pub label: String,
    /// Why the text indicates this type, when the model gave a reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl DocumentType {
    /// Parse a classification reply.
    ///
    /// Accepts `document_type`, `type`, or `label` as the label key. Replies that are not JSON
    /// are used verbatim as the label.
    pub fn from_reply(reply: &str) -> Self {
        let trimmed = reply.trim();
        match parse_json_reply(trimmed) {
            Some(Value::Object(map)) => {
                let label = ["document_type", "type", "label"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .unwrap_or(DEFAULT_DOCUMENT_TYPE)
                    .to_string();
                let explanation = map
                    .get("explanation")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string);
                Self { label, explanation }
            }
            _ if trimmed.is_empty() => Self::unknown(),
            _ => Self {
                label: trimmed.to_string(),
                explanation: None,
            },
        }
    }

    /// Placeholder used when no classification is available.
    pub fn unknown() -> Self {
        Self {
            label: DEFAULT_DOCUMENT_TYPE.to_string(),
            explanation: None,
        }
    }
}

/// Result of analyzing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentAnalysis {
    /// Prose summary of the document.
    pub summary: String,
    /// Classified document type.
    pub document_type: DocumentType,
    /// Type-specific key facts (parties, dates, values, ...).
    pub key_information: Map<String, Value>,
}

/// Runs the summary, classification, and key-information prompts against a model.
#[derive(Clone)]
pub struct DocumentAnalyzer {
    llm: Arc<dyn LlmClient>,
}

impl DocumentAnalyzer {
    /// Create an analyzer backed by the given model client.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Analyze a document's full text.
    pub async fn process_document(&self, text: &str) -> Result<DocumentAnalysis, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyDocument);
        }
        let started = Instant::now();
        let char_count = text.chars().count();

        let summary = self.summarize(text).await?;
        let (document_type, key_information) = if char_count > LONG_DOCUMENT_CHARS {
            let chunks = chunk_text(
                text,
                &ChunkingOptions::characters(ANALYSIS_CHUNK_SIZE, ANALYSIS_CHUNK_OVERLAP),
            )?;
            let document_type = self.classify(&summary).await?;
            let first_chunk = chunks.first().map(String::as_str).unwrap_or(text);
            let key_information = self
                .extract_key_information(first_chunk, &document_type)
                .await?;
            (document_type, key_information)
        } else {
            let document_type = self.classify(text).await?;
            let key_information = self.extract_key_information(text, &document_type).await?;
            (document_type, key_information)
        };

        tracing::info!(
            chars = char_count,
            document_type = %document_type.label,
            key_fields = key_information.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Document analyzed"
        );

        Ok(DocumentAnalysis {
            summary,
            document_type,
            key_information,
        })
    }

    /// Summarize the document.
    pub async fn summarize(&self, text: &str) -> Result<String, AnalysisError> {
        let input = truncate_chars(text, prompts::SUMMARY_INPUT_CHARS);
        let request = CompletionRequest::new(prompts::summary_prompt(input), 0.3, 1000);
        Ok(self.llm.complete(request).await?)
    }

    /// Classify the document type from text or a summary.
    pub async fn classify(&self, text: &str) -> Result<DocumentType, AnalysisError> {
        let input = truncate_chars(text, prompts::CLASSIFICATION_INPUT_CHARS);
        let request = CompletionRequest::new(prompts::classification_prompt(input), 0.2, 150).json();
        let reply = self.llm.complete(request).await?;
        Ok(DocumentType::from_reply(&reply))
    }

    /// Extract type-specific key information from an excerpt.
    ///
    /// A reply that is not a JSON object yields an empty map.
    pub async fn extract_key_information(
        &self,
        excerpt: &str,
        document_type: &DocumentType,
    ) -> Result<Map<String, Value>, AnalysisError> {
        let input = truncate_chars(excerpt, prompts::KEY_INFORMATION_INPUT_CHARS);
        let request = CompletionRequest::new(
            prompts::key_information_prompt(&document_type.label, input),
            0.2,
            1000,
        )
        .json();
        let reply = self.llm.complete(request).await?;
        match parse_json_reply(&reply) {
            Some(Value::Object(map)) => Ok(map),
            _ => {
                tracing::warn!(
                    reply_chars = reply.chars().count(),
                    "Key information reply was not a JSON object"
                );
                Ok(Map::new())
            }
        }
    }
}
