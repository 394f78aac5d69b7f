//! JSON schema builders for MCP tools.

use crate::storage::{DEFAULT_CHAT_HISTORY_LIMIT, DEFAULT_DOCUMENT_LIST_LIMIT};
use serde_json::{Map, Value};

/// Build the schema describing the `analyze-document` tool input.
pub(crate) fn analyze_document_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "text".into(),
        string_schema("Document text to analyze; provide either `text` or `path`"),
    );
    properties.insert(
        "path".into(),
        string_schema("Path to a PDF, DOCX, or TXT file readable by the server"),
    );
    properties.insert(
        "filename".into(),
        string_schema("Name stored with `text` input; defaults to 'document.txt'"),
    );

    let mut force_schema = Map::new();
    force_schema.insert("type".into(), Value::String("boolean".into()));
    force_schema.insert(
        "description".into(),
        Value::String("Analyze even when identical text is already stored".into()),
    );
    force_schema.insert("default".into(), Value::Bool(false));
    properties.insert("force".into(), Value::Object(force_schema));

    finalize_object_schema(properties, &[])
}

/// Build the schema describing the `ask-document` tool input.
pub(crate) fn ask_document_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("document_id".into(), document_id_schema());
    properties.insert(
        "question".into(),
        string_schema("Question answered from the document's most relevant passages"),
    );
    finalize_object_schema(properties, &["document_id", "question"])
}

/// Build the schema describing the `legal-information` tool input.
pub(crate) fn legal_information_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "query".into(),
        string_schema("General legal question, not tied to a stored document"),
    );
    finalize_object_schema(properties, &["query"])
}

/// Build the schema describing the `list-documents` tool input.
pub(crate) fn list_documents_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "limit".into(),
        limit_schema("Maximum documents to return", DEFAULT_DOCUMENT_LIST_LIMIT),
    );
    finalize_object_schema(properties, &[])
}

/// Build the schema describing the `get-document` tool input.
pub(crate) fn get_document_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("document_id".into(), document_id_schema());

    let mut text_schema = Map::new();
    text_schema.insert("type".into(), Value::String("boolean".into()));
    text_schema.insert(
        "description".into(),
        Value::String("Include the full document text in the response".into()),
    );
    text_schema.insert("default".into(), Value::Bool(false));
    properties.insert("include_text".into(), Value::Object(text_schema));

    finalize_object_schema(properties, &["document_id"])
}

/// Build the schema for tools addressing a single document.
pub(crate) fn document_id_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("document_id".into(), document_id_schema());
    finalize_object_schema(properties, &["document_id"])
}

/// Build the schema describing the `chat-history` tool input.
pub(crate) fn chat_history_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("document_id".into(), document_id_schema());
    properties.insert(
        "limit".into(),
        limit_schema("Maximum interactions to return", DEFAULT_CHAT_HISTORY_LIMIT),
    );
    finalize_object_schema(properties, &["document_id"])
}

/// Schema for tools that take no arguments.
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    finalize_object_schema(Map::new(), &[])
}

fn document_id_schema() -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("integer".into()));
    schema.insert(
        "description".into(),
        Value::String("Identifier returned by analyze-document or list-documents".into()),
    );
    schema.insert("minimum".into(), Value::Number(1.into()));
    Value::Object(schema)
}

fn limit_schema(description: &str, default: i64) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("integer".into()));
    schema.insert("description".into(), Value::String(description.into()));
    schema.insert("minimum".into(), Value::Number(1.into()));
    schema.insert("default".into(), Value::Number(default.into()));
    Value::Object(schema)
}

fn string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_schema_requires_document_and_question() {
        let schema = ask_document_input_schema();
        assert_eq!(
            schema["required"],
            Value::Array(vec!["document_id".into(), "question".into()])
        );
        assert_eq!(schema["properties"]["document_id"]["type"], "integer");
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn analyze_schema_has_no_required_fields() {
        let schema = analyze_document_input_schema();
        assert!(schema.get("required").is_none());
        assert_eq!(schema["properties"]["force"]["default"], false);
    }
}
