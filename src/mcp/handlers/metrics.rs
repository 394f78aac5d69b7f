//! Handler for the metrics tool.

use std::sync::Arc;

use crate::processing::ProcessingApi;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde_json::json;

/// Handle the `metrics` tool, returning the current analyzer counters.
pub(crate) async fn handle_metrics(
    processing: &Arc<dyn ProcessingApi>,
) -> Result<CallToolResult, McpError> {
    let snapshot = processing.metrics_snapshot();
    Ok(CallToolResult::structured(json!({
        "documentsAnalyzed": snapshot.documents_analyzed,
        "entitiesExtracted": snapshot.entities_extracted,
        "chunksIndexed": snapshot.chunks_indexed,
        "questionsAnswered": snapshot.questions_answered,
    })))
}
