//! Processing service coordinating extraction, analysis, entities, retrieval, and storage.

use crate::{
    analysis::DocumentAnalyzer,
    assistant::LegalAssistant,
    config::get_config,
    embedding::{EmbeddingClient, get_embedding_client},
    extraction::{DocumentFormat, extract_document_text},
    highlight::highlight_entities_in_text,
    llm::{LlmClient, get_llm_client},
    metrics::{AnalyzerMetrics, MetricsSnapshot},
    ner::EntityExtractor,
    processing::{
        chunking::ChunkingOptions,
        retrieval::{DocumentIndexer, fallback_context},
        sanitize::{sanitize_filename, sanitize_question},
        types::{
            AnalysisReport, ChatAnswer, ExtractedDocument, HealthSnapshot, LoadedDocument,
            ProcessingError,
        },
        workspace::UploadWorkspace,
    },
    qdrant::compute_chunk_hash,
    storage::{ChatInteraction, Database, DocumentSummary, StoredDocument},
    vector_store::{VectorStore, build_vector_store},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Coordinates the full document workflow shared by the HTTP, MCP, and CLI surfaces.
///
/// The service owns long-lived handles to the model client, vector store, database, and metrics
/// registry. Construct it once near process start and share it through an `Arc`.
pub struct ProcessingService {
    analyzer: DocumentAnalyzer,
    extractor: EntityExtractor,
    indexer: DocumentIndexer,
    assistant: LegalAssistant,
    database: Database,
    workspace: UploadWorkspace,
    metrics: Arc<AnalyzerMetrics>,
}

/// Components injected into [`ProcessingService::from_parts`].
pub struct ServiceComponents {
    /// Chat model used for analysis, entities, and answers.
    pub llm: Arc<dyn LlmClient>,
    /// Embedding provider for retrieval chunks and questions.
    pub embedding: Arc<dyn EmbeddingClient>,
    /// Backend holding chunk vectors.
    pub vector_store: Arc<dyn VectorStore>,
    /// Migrated database handle.
    pub database: Database,
    /// Prepared upload directory.
    pub workspace: UploadWorkspace,
    /// Retrieval chunking parameters.
    pub chunking: ChunkingOptions,
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Whether entity extraction also queries the model.
    pub ner_use_llm: bool,
}

/// Abstraction over the processing pipeline used by external surfaces (HTTP, MCP, CLI).
#[async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Extract text from an upload without analyzing or storing it.
    async fn extract_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ExtractedDocument, ProcessingError>;

    /// Extract, analyze, store, and index an uploaded file.
    async fn analyze_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<AnalysisReport, ProcessingError>;

    /// Analyze, store, and index already-extracted text.
    async fn analyze_text(
        &self,
        filename: &str,
        text: String,
    ) -> Result<AnalysisReport, ProcessingError>;

    /// Answer a question about a stored document and record the interaction.
    async fn ask(&self, document_id: i64, question: &str) -> Result<ChatAnswer, ProcessingError>;

    /// Answer a general legal question.
    async fn legal_information(&self, query: &str) -> Result<String, ProcessingError>;

    /// Saved documents, newest first.
    async fn list_documents(&self, limit: i64) -> Result<Vec<DocumentSummary>, ProcessingError>;

    /// Fetch one stored document.
    async fn get_document(&self, document_id: i64) -> Result<StoredDocument, ProcessingError>;

    /// Re-index a stored document for questions and return it.
    async fn load_document(&self, document_id: i64) -> Result<LoadedDocument, ProcessingError>;

    /// Delete a document, its entities, chat history, and vectors.
    async fn delete_document(&self, document_id: i64) -> Result<(), ProcessingError>;

    /// Recent interactions for a document, newest first.
    async fn chat_history(
        &self,
        document_id: i64,
        limit: i64,
    ) -> Result<Vec<ChatInteraction>, ProcessingError>;

    /// Document text rendered as HTML with highlighted entities.
    async fn highlighted_document(&self, document_id: i64) -> Result<String, ProcessingError>;

    /// Stored document with exactly this text, if any.
    async fn find_duplicate(&self, text: &str) -> Result<Option<DocumentSummary>, ProcessingError>;

    /// Reachability of the backing services.
    async fn health(&self) -> HealthSnapshot;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Build the service from configuration: providers, vector store, database, and workspace.
    pub async fn new() -> Result<Self, ProcessingError> {
        let config = get_config();
        tracing::info!(provider = ?config.llm_provider, model = %config.chat_model, "Initializing model client");
        let llm = get_llm_client()?;
        let embedding = get_embedding_client()?;
        let vector_store = build_vector_store().await?;
        let database = Database::setup(&config.database_url).await?;
        tracing::info!(url = %config.database_url, "Database ready");
        let workspace = UploadWorkspace::prepare(&config.upload_dir)?;

        Ok(Self::from_parts(ServiceComponents {
            llm,
            embedding,
            vector_store,
            database,
            workspace,
            chunking: ChunkingOptions {
                chunk_size: config.rag_chunk_size,
                overlap: config.rag_chunk_overlap,
                unit: config.chunk_length_unit,
                model: config.embedding_model.clone(),
            },
            top_k: config.rag_top_k,
            ner_use_llm: config.ner_use_llm,
        }))
    }

    /// Assemble the service from explicit components.
    pub fn from_parts(components: ServiceComponents) -> Self {
        let ServiceComponents {
            llm,
            embedding,
            vector_store,
            database,
            workspace,
            chunking,
            top_k,
            ner_use_llm,
        } = components;

        let extractor = if ner_use_llm {
            EntityExtractor::new(llm.clone())
        } else {
            EntityExtractor::rules_only()
        };

        Self {
            analyzer: DocumentAnalyzer::new(llm.clone()),
            extractor,
            indexer: DocumentIndexer::new(embedding, vector_store, chunking, top_k),
            assistant: LegalAssistant::new(llm),
            database,
            workspace,
            metrics: Arc::new(AnalyzerMetrics::new()),
        }
    }

    async fn extract_to_text(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(String, DocumentFormat, String), ProcessingError> {
        let name = sanitize_filename(filename)
            .ok_or_else(|| ProcessingError::InvalidInput(format!("invalid filename '{filename}'")))?;
        let format = DocumentFormat::from_filename(&name)?;
        let upload = self.workspace.store(&name, &bytes).await?;

        let extraction_path = upload.path().to_path_buf();
        let extracted =
            tokio::task::spawn_blocking(move || extract_document_text(&extraction_path)).await;
        self.workspace.discard(upload).await;

        let text = extracted.map_err(|error| ProcessingError::Io(std::io::Error::other(error)))??;
        tracing::info!(
            filename = %name,
            format = %format,
            bytes = bytes.len(),
            characters = text.chars().count(),
            "Document text extracted"
        );
        Ok((name, format, text))
    }

    async fn require_document(&self, document_id: i64) -> Result<StoredDocument, ProcessingError> {
        self.database
            .get_document_by_id(document_id)
            .await?
            .ok_or(ProcessingError::NotFound(document_id))
    }

    /// Extract text from an upload without analyzing or storing it.
    pub async fn extract_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ExtractedDocument, ProcessingError> {
        let (filename, format, text) = self.extract_to_text(filename, bytes).await?;
        Ok(ExtractedDocument {
            filename,
            format,
            characters: text.chars().count(),
            text,
        })
    }

    /// Extract, analyze, store, and index an uploaded file.
    pub async fn analyze_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<AnalysisReport, ProcessingError> {
        let (filename, _, text) = self.extract_to_text(filename, bytes).await?;
        self.analyze_text(&filename, text).await
    }

    /// Analyze, store, and index already-extracted text.
    pub async fn analyze_text(
        &self,
        filename: &str,
        text: String,
    ) -> Result<AnalysisReport, ProcessingError> {
        let started = Instant::now();
        let filename = sanitize_filename(filename)
            .ok_or_else(|| ProcessingError::InvalidInput(format!("invalid filename '{filename}'")))?;

        let analysis = self.analyzer.process_document(&text).await?;
        let entities = self.extractor.extract_legal_entities(&text).await?;
        let embeddings = self.indexer.create_document_embeddings(&text).await?;

        let document_id = self
            .database
            .save_document(&filename, &text, Some(&analysis))
            .await?;
        self.database.save_entities(document_id, &entities).await?;
        let chunks_indexed = self.indexer.index_document(document_id, embeddings).await?;

        self.metrics.record_document(entities.len() as u64);
        self.metrics.record_chunks(chunks_indexed as u64);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            document_id,
            filename = %filename,
            document_type = %analysis.document_type.label,
            entities = entities.len(),
            chunks = chunks_indexed,
            elapsed_ms,
            "Document processed"
        );

        Ok(AnalysisReport {
            document_id,
            filename,
            characters: text.chars().count(),
            analysis,
            entities,
            chunks_indexed,
            elapsed_ms,
        })
    }

    /// Answer a question about a stored document and record the interaction.
    ///
    /// The document is re-indexed when its chunks are missing. When retrieval fails the leading
    /// document text is used as context. A failure to record the interaction is logged and the
    /// answer is still returned.
    pub async fn ask(&self, document_id: i64, question: &str) -> Result<ChatAnswer, ProcessingError> {
        let question = sanitize_question(question)
            .ok_or_else(|| ProcessingError::InvalidInput("question must not be empty".into()))?;
        let document = self.require_document(document_id).await?;

        let context = match self
            .indexer
            .ensure_indexed(document_id, &document.document_text)
            .await
        {
            Ok(rebuilt) => {
                if rebuilt > 0 {
                    self.metrics.record_chunks(rebuilt as u64);
                }
                match self
                    .indexer
                    .perform_document_search(document_id, &question, &document.document_text)
                    .await
                {
                    Ok(context) => context,
                    Err(error) => {
                        tracing::warn!(document_id, error = %error, "Retrieval failed; using leading text");
                        fallback_context(&document.document_text)
                    }
                }
            }
            Err(error) => {
                tracing::warn!(document_id, error = %error, "Indexing failed; using leading text");
                fallback_context(&document.document_text)
            }
        };

        let analysis = document.analysis();
        let answer = self
            .assistant
            .get_chatbot_response(&question, &context.context, analysis.as_ref())
            .await?;

        if let Err(error) = self
            .database
            .save_chat_interaction(document_id, &question, &answer)
            .await
        {
            tracing::warn!(document_id, error = %error, "Failed to record chat interaction");
        }
        self.metrics.record_question();
        tracing::info!(
            document_id,
            context_chunks = context.chunks,
            fallback = context.used_fallback,
            "Question answered"
        );

        Ok(ChatAnswer {
            document_id,
            question,
            answer,
            context_chunks: context.chunks,
            used_fallback_context: context.used_fallback,
        })
    }

    /// Answer a general legal question.
    pub async fn legal_information(&self, query: &str) -> Result<String, ProcessingError> {
        let query = sanitize_question(query)
            .ok_or_else(|| ProcessingError::InvalidInput("query must not be empty".into()))?;
        Ok(self.assistant.get_legal_information(&query).await?)
    }

    /// Saved documents, newest first.
    pub async fn list_documents(&self, limit: i64) -> Result<Vec<DocumentSummary>, ProcessingError> {
        Ok(self.database.list_documents(limit).await?)
    }

    /// Fetch one stored document.
    pub async fn get_document(&self, document_id: i64) -> Result<StoredDocument, ProcessingError> {
        self.require_document(document_id).await
    }

    /// Re-index a stored document for questions and return it.
    pub async fn load_document(&self, document_id: i64) -> Result<LoadedDocument, ProcessingError> {
        let document = self.require_document(document_id).await?;
        let chunks_indexed = self
            .indexer
            .rebuild(document_id, &document.document_text)
            .await?;
        self.metrics.record_chunks(chunks_indexed as u64);
        Ok(LoadedDocument {
            document,
            chunks_indexed,
        })
    }

    /// Delete a document, its entities, chat history, and vectors.
    pub async fn delete_document(&self, document_id: i64) -> Result<(), ProcessingError> {
        if !self.database.delete_document(document_id).await? {
            return Err(ProcessingError::NotFound(document_id));
        }
        if let Err(error) = self.indexer.remove_document(document_id).await {
            tracing::warn!(document_id, error = %error, "Failed to remove document vectors");
        }
        tracing::info!(document_id, "Document deleted");
        Ok(())
    }

    /// Recent interactions for a document, newest first.
    pub async fn chat_history(
        &self,
        document_id: i64,
        limit: i64,
    ) -> Result<Vec<ChatInteraction>, ProcessingError> {
        self.require_document(document_id).await?;
        Ok(self.database.get_chat_history(document_id, limit).await?)
    }

    /// Document text rendered as HTML with highlighted entities.
    pub async fn highlighted_document(&self, document_id: i64) -> Result<String, ProcessingError> {
        let document = self.require_document(document_id).await?;
        Ok(highlight_entities_in_text(
            &document.document_text,
            &document.entities,
        ))
    }

    /// Stored document with exactly this text, if any.
    pub async fn find_duplicate(&self, text: &str) -> Result<Option<DocumentSummary>, ProcessingError> {
        Ok(self
            .database
            .find_document_by_hash(&compute_chunk_hash(text))
            .await?)
    }

    /// Probe the database to surface a lightweight health snapshot.
    pub async fn health(&self) -> HealthSnapshot {
        match self.database.list_documents(1).await {
            Ok(_) => HealthSnapshot {
                database_reachable: true,
                error: None,
            },
            Err(error) => {
                tracing::warn!(error = %error, "Database health probe failed");
                HealthSnapshot {
                    database_reachable: false,
                    error: Some(error.to_string()),
                }
            }
        }
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl ProcessingApi for ProcessingService {
    async fn extract_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ExtractedDocument, ProcessingError> {
        ProcessingService::extract_upload(self, filename, bytes).await
    }

    async fn analyze_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<AnalysisReport, ProcessingError> {
        ProcessingService::analyze_upload(self, filename, bytes).await
    }

    async fn analyze_text(
        &self,
        filename: &str,
        text: String,
    ) -> Result<AnalysisReport, ProcessingError> {
        ProcessingService::analyze_text(self, filename, text).await
    }

    async fn ask(&self, document_id: i64, question: &str) -> Result<ChatAnswer, ProcessingError> {
        ProcessingService::ask(self, document_id, question).await
    }

    async fn legal_information(&self, query: &str) -> Result<String, ProcessingError> {
        ProcessingService::legal_information(self, query).await
    }

    async fn list_documents(&self, limit: i64) -> Result<Vec<DocumentSummary>, ProcessingError> {
        ProcessingService::list_documents(self, limit).await
    }

    async fn get_document(&self, document_id: i64) -> Result<StoredDocument, ProcessingError> {
        ProcessingService::get_document(self, document_id).await
    }

    async fn load_document(&self, document_id: i64) -> Result<LoadedDocument, ProcessingError> {
        ProcessingService::load_document(self, document_id).await
    }

    async fn delete_document(&self, document_id: i64) -> Result<(), ProcessingError> {
        ProcessingService::delete_document(self, document_id).await
    }

    async fn chat_history(
        &self,
        document_id: i64,
        limit: i64,
    ) -> Result<Vec<ChatInteraction>, ProcessingError> {
        ProcessingService::chat_history(self, document_id, limit).await
    }

    async fn highlighted_document(&self, document_id: i64) -> Result<String, ProcessingError> {
        ProcessingService::highlighted_document(self, document_id).await
    }

    async fn find_duplicate(&self, text: &str) -> Result<Option<DocumentSummary>, ProcessingError> {
        ProcessingService::find_duplicate(self, text).await
    }

    async fn health(&self) -> HealthSnapshot {
        ProcessingService::health(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ProcessingService::metrics_snapshot(self)
    }
}
