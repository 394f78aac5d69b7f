//! Core data types and error definitions for the processing pipeline.

use crate::{
    analysis::{AnalysisError, DocumentAnalysis},
    embedding::EmbeddingClientError,
    extraction::{DocumentFormat, ExtractionError},
    llm::LlmClientError,
    ner::{EntityExtractionError, LegalEntity},
    storage::{StorageError, StoredDocument},
    vector_store::VectorStoreError,
};
use anyhow::Error as TokenizerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while turning raw text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Caller configured an impossible chunk budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Tokenizer resources were unavailable for the configured model.
    #[error("failed to initialize tokenizer for model '{model}': {source}")]
    Tokenizer {
        /// Model whose tokenizer we attempted to load.
        model: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
}

/// Errors emitted by the document processing pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Text could not be extracted from the upload.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Model-backed analysis failed.
    #[error("Document analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
    /// Entity extraction failed.
    #[error(transparent)]
    Entities(#[from] EntityExtractionError),
    /// Embedding provider failed to produce vectors.
    #[error(transparent)]
    Embedding(#[from] EmbeddingClientError),
    /// Vector store request failed.
    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),
    /// Database request failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Chunking step failed to segment the document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Chat model request failed.
    #[error(transparent)]
    Llm(#[from] LlmClientError),
    /// Upload workspace could not be written.
    #[error("Upload workspace error: {0}")]
    Io(#[from] std::io::Error),
    /// No document exists with this id.
    #[error("Document {0} not found")]
    NotFound(i64),
    /// Caller supplied unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ProcessingError {
    /// Whether the failure was caused by the caller's input rather than a backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::Extraction(
                    ExtractionError::UnsupportedFormat(_)
                        | ExtractionError::Encoding(_)
                        | ExtractionError::Pdf(_)
                        | ExtractionError::Docx(_)
                )
                | Self::Analysis(AnalysisError::EmptyDocument)
        )
    }
}

/// Text extracted from an upload without analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Sanitized file name.
    pub filename: String,
    /// Detected format.
    pub format: DocumentFormat,
    /// Character count of the extracted text.
    pub characters: usize,
    /// Extracted text.
    pub text: String,
}

/// Outcome of analyzing and storing a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Id assigned to the stored document.
    pub document_id: i64,
    /// Sanitized file name.
    pub filename: String,
    /// Character count of the document text.
    pub characters: usize,
    /// Summary, type, and key information.
    pub analysis: DocumentAnalysis,
    /// Extracted entities ordered by position.
    pub entities: Vec<LegalEntity>,
    /// Chunks written to the vector store.
    pub chunks_indexed: usize,
    /// Wall-clock processing time.
    pub elapsed_ms: u64,
}

/// Answer to a question about a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAnswer {
    /// Document the question was about.
    pub document_id: i64,
    /// Normalized question.
    pub question: String,
    /// Assistant answer.
    pub answer: String,
    /// Number of retrieved chunks used as context.
    pub context_chunks: usize,
    /// Whether the leading document text was used instead of retrieved chunks.
    pub used_fallback_context: bool,
}

/// Stored document re-indexed for questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedDocument {
    /// Stored document.
    pub document: StoredDocument,
    /// Chunks written to the vector store.
    pub chunks_indexed: usize,
}

/// Context assembled for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedContext {
    /// Text handed to the assistant.
    pub context: String,
    /// Number of retrieved chunks joined into `context`.
    pub chunks: usize,
    /// Whether the leading document text was used instead.
    pub used_fallback: bool,
}

/// Reachability of the backing services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HealthSnapshot {
    /// Whether the document database answered a probe query.
    pub database_reachable: bool,
    /// Probe failure, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
