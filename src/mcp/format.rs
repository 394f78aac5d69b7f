//! Formatting helpers shared across MCP handlers and resources.

use crate::{
    config::Config,
    metrics::MetricsSnapshot,
    ner::EntityType,
    processing::HealthSnapshot,
};
use rmcp::model::ResourceContents;
use serde::Serialize;
use serde_json::{Value, json};

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Entity types with their display colors and overlap priority.
pub(crate) fn entity_types_payload() -> Value {
    let types: Vec<Value> = EntityType::KNOWN
        .iter()
        .map(|entity_type| {
            json!({
                "type": entity_type.label(),
                "color": entity_type.color(),
                "priority": entity_type.priority(),
            })
        })
        .collect();
    json!({ "entityTypes": types })
}

/// Health payload combining database reachability with the active configuration.
pub(crate) fn health_payload(
    snapshot: &HealthSnapshot,
    metrics: &MetricsSnapshot,
    config: Option<&Config>,
) -> Value {
    let mut payload = json!({
        "database": {
            "reachable": snapshot.database_reachable,
        },
        "metrics": metrics,
    });
    if let Some(error) = snapshot.error.as_ref() {
        payload["database"]["error"] = Value::String(error.clone());
    }
    if let Some(config) = config {
        payload["llm"] = json!({
            "provider": format!("{:?}", config.llm_provider).to_lowercase(),
            "model": config.chat_model,
        });
        payload["embedding"] = json!({
            "provider": format!("{:?}", config.embedding_provider).to_lowercase(),
            "model": config.embedding_model,
            "dimension": config.embedding_dimension,
        });
        payload["vectorStore"] = json!({
            "kind": format!("{:?}", config.vector_store).to_lowercase(),
            "collection": config.qdrant_collection_name,
        });
    }
    payload
}

/// Recommended tool flow for agent hosts.
pub(crate) fn usage_payload() -> Value {
    json!({
        "title": "Legalyze MCP Usage",
        "policy": [
            "Analyze a document once with `analyze-document`; reuse its documentId afterwards.",
            "Ask focused questions with `ask-document` instead of pasting document text into prompts.",
            "Answers are general information, not legal advice.",
            "Pass `force: true` only when re-analyzing identical text is intended.",
        ],
        "flows": [
            {
                "name": "Analyze & Ask",
                "steps": [
                    "analyze-document({ path } | { text, filename? })",
                    "ask-document({ document_id, question })",
                    "chat-history({ document_id, limit? })"
                ]
            },
            {
                "name": "Browse",
                "steps": [
                    "list-documents({ limit? })",
                    "get-document({ document_id, include_text? })",
                    "delete-document({ document_id })"
                ]
            }
        ]
    })
}

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_types_payload_lists_every_known_type() {
        let payload = entity_types_payload();
        let types = payload["entityTypes"].as_array().expect("array");
        assert_eq!(types.len(), EntityType::KNOWN.len());
        assert!(types.iter().any(|entry| entry["type"] == "CASE_CITATION"));
    }

    #[test]
    fn health_payload_reports_database_error() {
        let snapshot = HealthSnapshot {
            database_reachable: false,
            error: Some("database is locked".into()),
        };
        let payload = health_payload(&snapshot, &MetricsSnapshot::default(), None);
        assert_eq!(payload["database"]["reachable"], false);
        assert_eq!(payload["database"]["error"], "database is locked");
        assert!(payload.get("llm").is_none());
    }
}
