//! Handlers for document analysis and management tools.

use std::{path::Path, sync::Arc};

use crate::{
    highlight::group_entities_by_type,
    ner::LegalEntity,
    processing::ProcessingApi,
    storage::DEFAULT_DOCUMENT_LIST_LIMIT,
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{parse_arguments, processing_error, require_document_id};

const DEFAULT_TEXT_FILENAME: &str = "document.txt";

/// Request payload accepted by the `analyze-document` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeToolRequest {
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) path: Option<String>,
    #[serde(default)]
    pub(crate) filename: Option<String>,
    #[serde(default)]
    pub(crate) force: bool,
}

/// Handle the `analyze-document` tool for inline text or a server-side file.
pub(crate) async fn handle_analyze(
    processing: &Arc<dyn ProcessingApi>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: AnalyzeToolRequest = parse_arguments(arguments)?;

    let (filename, text) = match (args.text, args.path) {
        (Some(_), Some(_)) => {
            return Err(McpError::invalid_params(
                "Provide either `text` or `path`, not both",
                None,
            ));
        }
        (None, None) => {
            return Err(McpError::invalid_params(
                "One of `text` or `path` is required",
                None,
            ));
        }
        (Some(text), None) => {
            if text.trim().is_empty() {
                return Err(McpError::invalid_params("`text` must not be empty", None));
            }
            let filename = args
                .filename
                .unwrap_or_else(|| DEFAULT_TEXT_FILENAME.to_string());
            (filename, text)
        }
        (None, Some(path)) => {
            let bytes = tokio::fs::read(&path).await.map_err(|error| {
                McpError::invalid_params(format!("Cannot read '{path}': {error}"), None)
            })?;
            let filename = args.filename.unwrap_or_else(|| {
                Path::new(&path)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone())
            });
            let extracted = processing
                .extract_upload(&filename, bytes)
                .await
                .map_err(processing_error)?;
            (extracted.filename, extracted.text)
        }
    };

    if !args.force
        && let Some(existing) = processing
            .find_duplicate(&text)
            .await
            .map_err(processing_error)?
    {
        return Ok(CallToolResult::structured(json!({
            "status": "duplicate",
            "documentId": existing.id,
            "filename": existing.filename,
            "uploadDate": existing.upload_date,
        })));
    }

    let report = processing
        .analyze_text(&filename, text)
        .await
        .map_err(processing_error)?;

    Ok(CallToolResult::structured(json!({
        "status": "ok",
        "documentId": report.document_id,
        "filename": report.filename,
        "characters": report.characters,
        "documentType": report.analysis.document_type,
        "summary": report.analysis.summary,
        "keyInformation": report.analysis.key_information,
        "entities": entity_groups(&report.entities),
        "chunksIndexed": report.chunks_indexed,
        "elapsedMs": report.elapsed_ms,
    })))
}

/// Request payload accepted by the `list-documents` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct ListToolRequest {
    #[serde(default)]
    pub(crate) limit: Option<i64>,
}

/// Handle the `list-documents` tool.
pub(crate) async fn handle_list(
    processing: &Arc<dyn ProcessingApi>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: ListToolRequest = parse_arguments(arguments)?;
    let limit = match args.limit {
        Some(limit) if limit < 1 => {
            return Err(McpError::invalid_params("`limit` must be at least 1", None));
        }
        Some(limit) => limit,
        None => DEFAULT_DOCUMENT_LIST_LIMIT,
    };
    let documents = processing
        .list_documents(limit)
        .await
        .map_err(processing_error)?;
    Ok(CallToolResult::structured(json!({
        "count": documents.len(),
        "documents": documents,
    })))
}

/// Request payload accepted by the `get-document` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct GetToolRequest {
    pub(crate) document_id: i64,
    #[serde(default)]
    pub(crate) include_text: bool,
}

/// Handle the `get-document` tool.
pub(crate) async fn handle_get(
    processing: &Arc<dyn ProcessingApi>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: GetToolRequest = parse_arguments(arguments)?;
    let document_id = require_document_id(args.document_id)?;
    let document = processing
        .get_document(document_id)
        .await
        .map_err(processing_error)?;

    let mut payload = json!({
        "documentId": document.id,
        "filename": document.filename,
        "uploadDate": document.upload_date,
        "documentType": document.document_type,
        "documentTypeExplanation": document.document_type_explanation,
        "summary": document.summary,
        "keyInformation": document.key_information,
        "entities": entity_groups(&document.entities),
        "characters": document.document_text.chars().count(),
    });
    if args.include_text {
        payload["text"] = Value::String(document.document_text);
    }
    Ok(CallToolResult::structured(payload))
}

/// Request payload for tools addressing one document.
#[derive(Debug, Deserialize)]
pub(crate) struct DocumentToolRequest {
    pub(crate) document_id: i64,
}

/// Handle the `delete-document` tool.
pub(crate) async fn handle_delete(
    processing: &Arc<dyn ProcessingApi>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: DocumentToolRequest = parse_arguments(arguments)?;
    let document_id = require_document_id(args.document_id)?;
    processing
        .delete_document(document_id)
        .await
        .map_err(processing_error)?;
    Ok(CallToolResult::structured(json!({
        "status": "deleted",
        "documentId": document_id,
    })))
}

fn entity_groups(entities: &[LegalEntity]) -> Value {
    let mut groups = Map::new();
    for (entity_type, texts) in group_entities_by_type(entities) {
        groups.insert(entity_type.label().to_string(), json!(texts));
    }
    Value::Object(groups)
}
