//! HTTP surface for Legalyze.
//!
//! The router exposes the document workflow over JSON:
//!
//! - `POST /extract?filename=` – Extract text from raw file bytes without storing anything.
//! - `POST /documents?filename=` – Extract, analyze, store, and index an uploaded file.
//! - `POST /documents/text` – Analyze text that was extracted elsewhere.
//! - `GET /documents`, `GET /documents/:id`, `DELETE /documents/:id` – Browse and remove.
//! - `POST /documents/:id/load` – Re-index a stored document for questions.
//! - `GET /documents/:id/highlighted` – Document text as HTML with entity highlights.
//! - `POST|GET /documents/:id/chat` – Ask a question, or read recent questions and answers.
//! - `POST /legal-information` – General legal information, not tied to a document.
//! - `GET /metrics` and `GET /commands` – Counters and a machine-readable command catalog.
//!
//! The HTTP surface shares the processing service with the MCP server and the CLI, so behavior
//! is identical across interfaces.

use crate::processing::{ProcessingApi, ProcessingError};
use crate::storage::{DEFAULT_CHAT_HISTORY_LIMIT, DEFAULT_DOCUMENT_LIST_LIMIT};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router; request bodies larger than `max_body_bytes` are rejected.
pub fn create_router<S>(service: Arc<S>, max_body_bytes: usize) -> Router
where
    S: ProcessingApi + 'static,
{
    Router::new()
        .route("/extract", post(extract_upload::<S>))
        .route(
            "/documents",
            get(list_documents::<S>).post(analyze_upload::<S>),
        )
        .route("/documents/text", post(analyze_text::<S>))
        .route(
            "/documents/:id",
            get(get_document::<S>).delete(delete_document::<S>),
        )
        .route("/documents/:id/load", post(load_document::<S>))
        .route("/documents/:id/highlighted", get(highlighted_document::<S>))
        .route(
            "/documents/:id/chat",
            get(chat_history::<S>).post(ask_document::<S>),
        )
        .route("/legal-information", post(legal_information::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(service)
}

#[derive(Deserialize)]
struct UploadQuery {
    filename: String,
}

#[derive(Deserialize)]
struct LimitQuery {
    #[serde(default)]
    limit: Option<i64>,
}

/// Request body for `POST /documents/text`.
#[derive(Deserialize)]
struct AnalyzeTextRequest {
    filename: String,
    text: String,
}

/// Request body for `POST /documents/:id/chat`.
#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

/// Request body for `POST /legal-information`.
#[derive(Deserialize)]
struct LegalInformationRequest {
    query: String,
}

#[derive(Serialize)]
struct LegalInformationResponse {
    query: String,
    answer: String,
}

async fn extract_upload<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Response, AppError>
where
    S: ProcessingApi,
{
    let extracted = service
        .extract_upload(&query.filename, body.to_vec())
        .await?;
    Ok(Json(extracted).into_response())
}

async fn analyze_upload<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Response, AppError>
where
    S: ProcessingApi,
{
    let report = service
        .analyze_upload(&query.filename, body.to_vec())
        .await?;
    tracing::info!(
        document_id = report.document_id,
        entities = report.entities.len(),
        chunks = report.chunks_indexed,
        elapsed_ms = report.elapsed_ms,
        "Upload analyzed"
    );
    Ok((StatusCode::CREATED, Json(report)).into_response())
}

async fn analyze_text<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AnalyzeTextRequest>,
) -> Result<Response, AppError>
where
    S: ProcessingApi,
{
    let report = service
        .analyze_text(&request.filename, request.text)
        .await?;
    Ok((StatusCode::CREATED, Json(report)).into_response())
}

async fn list_documents<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<LimitQuery>,
) -> Result<Response, AppError>
where
    S: ProcessingApi,
{
    let limit = query.limit.unwrap_or(DEFAULT_DOCUMENT_LIST_LIMIT).max(1);
    let documents = service.list_documents(limit).await?;
    Ok(Json(json!({ "documents": documents })).into_response())
}

async fn get_document<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError>
where
    S: ProcessingApi,
{
    Ok(Json(service.get_document(id).await?).into_response())
}

async fn delete_document<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError>
where
    S: ProcessingApi,
{
    service.delete_document(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn load_document<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError>
where
    S: ProcessingApi,
{
    Ok(Json(service.load_document(id).await?).into_response())
}

async fn highlighted_document<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError>
where
    S: ProcessingApi,
{
    Ok(Html(service.highlighted_document(id).await?))
}

async fn ask_document<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<i64>,
    Json(request): Json<AskRequest>,
) -> Result<Response, AppError>
where
    S: ProcessingApi,
{
    Ok(Json(service.ask(id, &request.question).await?).into_response())
}

async fn chat_history<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<i64>,
    Query(query): Query<LimitQuery>,
) -> Result<Response, AppError>
where
    S: ProcessingApi,
{
    let limit = query.limit.unwrap_or(DEFAULT_CHAT_HISTORY_LIMIT).max(1);
    let history = service.chat_history(id, limit).await?;
    Ok(Json(json!({ "document_id": id, "history": history })).into_response())
}

async fn legal_information<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<LegalInformationRequest>,
) -> Result<Json<LegalInformationResponse>, AppError>
where
    S: ProcessingApi,
{
    let answer = service.legal_information(&request.query).await?;
    Ok(Json(LegalInformationResponse {
        query: request.query,
        answer,
    }))
}

async fn get_metrics<S>(State(service): State<Arc<S>>) -> Response
where
    S: ProcessingApi,
{
    Json(service.metrics_snapshot()).into_response()
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "extract",
                method: "POST",
                path: "/extract?filename={name}",
                description: "Extract plain text from raw PDF, DOCX, or TXT bytes without storing it.",
                request_example: None,
            },
            CommandDescriptor {
                name: "analyze_upload",
                method: "POST",
                path: "/documents?filename={name}",
                description: "Extract, summarize, classify, and extract entities from raw file bytes, then store and index the document.",
                request_example: None,
            },
            CommandDescriptor {
                name: "analyze_text",
                method: "POST",
                path: "/documents/text",
                description: "Analyze, store, and index text that was extracted elsewhere.",
                request_example: Some(json!({
                    "filename": "lease.txt",
                    "text": "This Lease Agreement is made between ..."
                })),
            },
            CommandDescriptor {
                name: "list_documents",
                method: "GET",
                path: "/documents?limit={n}",
                description: "List saved documents, newest first.",
                request_example: None,
            },
            CommandDescriptor {
                name: "get_document",
                method: "GET",
                path: "/documents/{id}",
                description: "Return a stored document with its analysis and entities.",
                request_example: None,
            },
            CommandDescriptor {
                name: "delete_document",
                method: "DELETE",
                path: "/documents/{id}",
                description: "Delete a document together with its entities, chat history, and vectors.",
                request_example: None,
            },
            CommandDescriptor {
                name: "load_document",
                method: "POST",
                path: "/documents/{id}/load",
                description: "Rebuild the retrieval index for a stored document.",
                request_example: None,
            },
            CommandDescriptor {
                name: "highlighted_document",
                method: "GET",
                path: "/documents/{id}/highlighted",
                description: "Render the document text as HTML with color-coded entities.",
                request_example: None,
            },
            CommandDescriptor {
                name: "ask_document",
                method: "POST",
                path: "/documents/{id}/chat",
                description: "Answer a question from the document's most relevant passages.",
                request_example: Some(json!({ "question": "When does the lease end?" })),
            },
            CommandDescriptor {
                name: "chat_history",
                method: "GET",
                path: "/documents/{id}/chat?limit={n}",
                description: "Return recent questions and answers for a document, newest first.",
                request_example: None,
            },
            CommandDescriptor {
                name: "legal_information",
                method: "POST",
                path: "/legal-information",
                description: "General legal information with a not-legal-advice disclaimer.",
                request_example: Some(json!({ "query": "What is a force majeure clause?" })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return analyzer counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(ProcessingError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ProcessingError::NotFound(_) => StatusCode::NOT_FOUND,
            error if error.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, self.0.to_string()).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self(inner)
    }
}
