//! Model-based recognition of legal entities.

use super::types::{EntityType, LegalEntity};
use crate::{
    llm::{CompletionRequest, LlmClient, LlmClientError, parse_json_reply},
    processing::sanitize::truncate_chars,
};
use serde::Deserialize;

/// Characters of document text sent to the model.
pub const LLM_NER_INPUT_CHARS: usize = 10_000;

#[derive(Deserialize)]
struct EntityReply {
    #[serde(default)]
    entities: Vec<EntityItem>,
}

#[derive(Deserialize)]
struct EntityItem {
    #[serde(default)]
    text: String,
    #[serde(default, rename = "type")]
    entity_type: Option<String>,
}

fn entity_prompt(text: &str) -> String {
    format!(
        "Extract and identify legal entities from the following legal text. Focus on:\n\n\
         1. PARTY: Names of parties to the agreement/case\n\
         2. LAW: References to laws, acts, statutes, or regulations\n\
         3. COURT: Names of courts\n\
         4. JUDGE: Names of judges\n\
         5. JURISDICTION: Mentioned jurisdictions\n\
         6. LEGAL_TERM: Specialized legal terminology\n\
         7. CASE_CITATION: Citations to legal cases\n\n\
         For each entity, provide the exact text of the entity and its type from the list above.\n\n\
         Respond with a JSON object of the form \
         {{\"entities\": [{{\"text\": \"...\", \"type\": \"...\"}}]}}.\n\n\
         TEXT:\n{text}"
    )
}

/// Ask the model for entities in the leading part of `text`.
///
/// Every literal occurrence of each returned entity in the full `text` becomes a span. Replies
/// that do not parse yield no entities.
pub async fn extract_with_llm(
    llm: &dyn LlmClient,
    text: &str,
) -> Result<Vec<LegalEntity>, LlmClientError> {
    let excerpt = truncate_chars(text, LLM_NER_INPUT_CHARS);
    let request = CompletionRequest::new(entity_prompt(excerpt), 0.2, 1500).json();
    let reply = llm.complete(request).await?;
    Ok(locate_entities(text, &reply))
}

fn locate_entities(text: &str, reply: &str) -> Vec<LegalEntity> {
    let parsed = parse_json_reply(reply).and_then(|value| {
        // A bare array is accepted alongside the requested object shape.
        let value = match value {
            serde_json::Value::Array(items) => serde_json::json!({ "entities": items }),
            other => other,
        };
        serde_json::from_value::<EntityReply>(value).ok()
    });
    let Some(parsed) = parsed else {
        tracing::warn!(
            reply_chars = reply.chars().count(),
            "Entity reply was not valid JSON"
        );
        return Vec::new();
    };

    let mut entities = Vec::new();
    for item in parsed.entities {
        let needle = item.text.trim();
        if needle.is_empty() {
            continue;
        }
        let entity_type = item
            .entity_type
            .as_deref()
            .map(EntityType::from_label)
            .unwrap_or(EntityType::LegalTerm);
        entities.extend(text.match_indices(needle).map(|(start, found)| LegalEntity {
            text: found.to_string(),
            start,
            end: start + found.len(),
            entity_type: entity_type.clone(),
        }));
    }
    entities
}
