//! Presentation helpers for analyzed documents.

use crate::ner::{EntityType, LegalEntity};
use serde_json::{Map, Value};

/// Render `text` as HTML with each entity wrapped in a colored span.
///
/// Entities must not overlap (the extractor guarantees this); any that do, or that fall outside
/// the text or off a char boundary, are skipped.
pub fn highlight_entities_in_text(text: &str, entities: &[LegalEntity]) -> String {
    let mut sorted: Vec<&LegalEntity> = entities.iter().collect();
    sorted.sort_by_key(|entity| entity.start);

    let mut body = String::with_capacity(text.len() * 2);
    let mut cursor = 0;
    for entity in sorted {
        let valid = entity.start >= cursor
            && entity.start < entity.end
            && entity.end <= text.len()
            && text.is_char_boundary(entity.start)
            && text.is_char_boundary(entity.end);
        if !valid {
            continue;
        }
        body.push_str(&escape_html(&text[cursor..entity.start]));
        body.push_str(&format!(
            "<span style=\"background-color: {}; padding: 2px; border-radius: 3px;\" title=\"{}\">{}</span>",
            entity.entity_type.color(),
            escape_html(entity.entity_type.label()),
            escape_html(&text[entity.start..entity.end]),
        ));
        cursor = entity.end;
    }
    body.push_str(&escape_html(&text[cursor..]));

    format!(
        "<div style=\"font-family: monospace; white-space: pre-wrap; line-height: 1.5;\">{}</div>",
        body.replace('\n', "<br>")
    )
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Group entity texts by type, in order of first appearance, without repeats.
pub fn group_entities_by_type(entities: &[LegalEntity]) -> Vec<(EntityType, Vec<String>)> {
    let mut groups: Vec<(EntityType, Vec<String>)> = Vec::new();
    for entity in entities {
        let index = match groups
            .iter()
            .position(|(entity_type, _)| *entity_type == entity.entity_type)
        {
            Some(index) => index,
            None => {
                groups.push((entity.entity_type.clone(), Vec::new()));
                groups.len() - 1
            }
        };
        let texts = &mut groups[index].1;
        if !texts.contains(&entity.text) {
            texts.push(entity.text.clone());
        }
    }
    groups
}

/// Shorten `text` to at most `max_chars` characters, preferring a word boundary.
///
/// Text that already fits is returned unchanged; otherwise `...` is appended.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let head = crate::processing::sanitize::truncate_chars(text, max_chars);
    if head.len() == text.len() {
        return text.to_string();
    }
    match head.rfind(' ') {
        Some(last_space) => format!("{}...", &head[..last_space]),
        None => format!("{head}..."),
    }
}

/// Render key information as display text: `**key**: value` lines, nested maps as bullets.
pub fn format_key_information(info: &Map<String, Value>) -> String {
    let mut out = String::new();
    for (key, value) in info {
        out.push_str(&format!("**{key}**: "));
        match value {
            Value::Object(nested) => {
                out.push('\n');
                for (sub_key, sub_value) in nested {
                    out.push_str(&format!("  - {sub_key}: {}\n", display_value(sub_value)));
                }
            }
            other => {
                out.push_str(&display_value(other));
                out.push('\n');
            }
        }
    }
    out
}

/// Plain-text rendering of a JSON value: strings unquoted, arrays comma-joined.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
