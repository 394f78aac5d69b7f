//! Filter helpers for document-scoped Qdrant queries.

use serde_json::{Value, json};

/// Filter matching every point belonging to `document_id`.
pub fn document_filter(document_id: i64) -> Value {
    json!({
        "must": [
            {
                "key": "document_id",
                "match": { "value": document_id }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_filter_matches_on_id() {
        let filter = document_filter(42);
        assert_eq!(filter["must"][0]["key"], "document_id");
        assert_eq!(filter["must"][0]["match"]["value"], 42);
    }
}
