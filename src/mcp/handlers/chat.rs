//! Handlers for question answering tools.

use std::sync::Arc;

use crate::{processing::ProcessingApi, storage::DEFAULT_CHAT_HISTORY_LIMIT};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;
use serde_json::json;

use super::{parse_arguments, processing_error, require_document_id};

/// Request payload accepted by the `ask-document` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct AskToolRequest {
    pub(crate) document_id: i64,
    pub(crate) question: String,
}

/// Handle the `ask-document` tool.
pub(crate) async fn handle_ask(
    processing: &Arc<dyn ProcessingApi>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: AskToolRequest = parse_arguments(arguments)?;
    let document_id = require_document_id(args.document_id)?;
    if args.question.trim().is_empty() {
        return Err(McpError::invalid_params("`question` must not be empty", None));
    }

    let answer = processing
        .ask(document_id, &args.question)
        .await
        .map_err(processing_error)?;

    Ok(CallToolResult::structured(json!({
        "documentId": answer.document_id,
        "question": answer.question,
        "answer": answer.answer,
        "contextChunks": answer.context_chunks,
        "usedFallbackContext": answer.used_fallback_context,
    })))
}

/// Request payload accepted by the `legal-information` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct LegalInformationToolRequest {
    pub(crate) query: String,
}

/// Handle the `legal-information` tool.
pub(crate) async fn handle_legal_information(
    processing: &Arc<dyn ProcessingApi>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: LegalInformationToolRequest = parse_arguments(arguments)?;
    if args.query.trim().is_empty() {
        return Err(McpError::invalid_params("`query` must not be empty", None));
    }
    let answer = processing
        .legal_information(&args.query)
        .await
        .map_err(processing_error)?;
    Ok(CallToolResult::structured(json!({
        "query": args.query.trim(),
        "answer": answer,
    })))
}

/// Request payload accepted by the `chat-history` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatHistoryToolRequest {
    pub(crate) document_id: i64,
    #[serde(default)]
    pub(crate) limit: Option<i64>,
}

/// Handle the `chat-history` tool.
pub(crate) async fn handle_chat_history(
    processing: &Arc<dyn ProcessingApi>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: ChatHistoryToolRequest = parse_arguments(arguments)?;
    let document_id = require_document_id(args.document_id)?;
    let limit = match args.limit {
        Some(limit) if limit < 1 => {
            return Err(McpError::invalid_params("`limit` must be at least 1", None));
        }
        Some(limit) => limit,
        None => DEFAULT_CHAT_HISTORY_LIMIT,
    };

    let history = processing
        .chat_history(document_id, limit)
        .await
        .map_err(processing_error)?;
    Ok(CallToolResult::structured(json!({
        "documentId": document_id,
        "count": history.len(),
        "history": history,
    })))
}
