//! Tool handlers for the MCP server.

use crate::processing::ProcessingError;
use rmcp::{ErrorData as McpError, model::JsonObject};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod chat;
pub mod documents;
pub mod metrics;

/// Parse structured arguments supplied to a tool invocation.
pub(crate) fn parse_arguments<T: DeserializeOwned>(
    arguments: Option<JsonObject>,
) -> Result<T, McpError> {
    let value = arguments
        .map(Value::Object)
        .unwrap_or_else(|| Value::Object(JsonObject::new()));
    serde_json::from_value(value)
        .map_err(|err| McpError::invalid_params(format!("Invalid arguments: {err}"), None))
}

/// Map pipeline failures onto MCP errors: caller mistakes become `invalid_params`.
pub(crate) fn processing_error(error: ProcessingError) -> McpError {
    if matches!(error, ProcessingError::NotFound(_)) || error.is_client_error() {
        McpError::invalid_params(error.to_string(), None)
    } else {
        tracing::error!(error = %error, "MCP tool failed");
        McpError::internal_error(error.to_string(), None)
    }
}

pub(crate) fn require_document_id(document_id: i64) -> Result<i64, McpError> {
    if document_id < 1 {
        return Err(McpError::invalid_params(
            "`document_id` must be a positive integer",
            None,
        ));
    }
    Ok(document_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Args {
        document_id: i64,
    }

    #[test]
    fn missing_arguments_are_invalid_params() {
        let error = parse_arguments::<Args>(None).expect_err("missing field");
        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);

        let parsed: Args =
            parse_arguments(json!({ "document_id": 3 }).as_object().cloned()).expect("args");
        assert_eq!(parsed.document_id, 3);
    }

    #[test]
    fn not_found_maps_to_invalid_params() {
        let error = processing_error(ProcessingError::NotFound(9));
        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
        assert!(error.message.contains("9"));

        let error = processing_error(ProcessingError::Io(std::io::Error::other("disk")));
        assert_eq!(error.code, ErrorCode::INTERNAL_ERROR);
    }
}
