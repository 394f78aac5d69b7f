//! Records read back from the database.

use crate::analysis::{DocumentAnalysis, DocumentType};
use crate::ner::LegalEntity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored document with its analysis and entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Row identifier.
    pub id: i64,
    /// Uploaded file name.
    pub filename: String,
    /// Classified type label, when analyzed.
    pub document_type: Option<String>,
    /// Reason given for the classification.
    pub document_type_explanation: Option<String>,
    /// Upload timestamp (RFC 3339, UTC).
    pub upload_date: String,
    /// Extracted document text.
    pub document_text: String,
    /// SHA-256 of the document text.
    pub content_hash: String,
    /// Analysis summary, when analyzed.
    pub summary: Option<String>,
    /// Key information; empty when none was stored.
    pub key_information: Map<String, Value>,
    /// Extracted entities ordered by position.
    pub entities: Vec<LegalEntity>,
}

impl StoredDocument {
    /// Rebuild the analysis, when the document was analyzed.
    pub fn analysis(&self) -> Option<DocumentAnalysis> {
        let label = self.document_type.clone()?;
        Some(DocumentAnalysis {
            summary: self.summary.clone().unwrap_or_default(),
            document_type: DocumentType {
                label,
                explanation: self.document_type_explanation.clone(),
            },
            key_information: self.key_information.clone(),
        })
    }
}

/// Listing row for saved documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentSummary {
    /// Row identifier.
    pub id: i64,
    /// Uploaded file name.
    pub filename: String,
    /// Classified type label, when analyzed.
    pub document_type: Option<String>,
    /// Upload timestamp (RFC 3339, UTC).
    pub upload_date: String,
    /// Analysis summary, when analyzed.
    pub summary: Option<String>,
}

/// One question and answer about a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatInteraction {
    /// Row identifier.
    pub id: i64,
    /// Document the question was about.
    pub document_id: i64,
    /// User question.
    pub user_query: String,
    /// Assistant answer.
    pub assistant_response: String,
    /// Time of the interaction (RFC 3339, UTC).
    pub timestamp: String,
}

#[derive(sqlx::FromRow)]
pub(crate) struct DocumentRow {
    pub(crate) id: i64,
    pub(crate) filename: String,
    pub(crate) document_type: Option<String>,
    pub(crate) document_type_explanation: Option<String>,
    pub(crate) upload_date: String,
    pub(crate) document_text: String,
    pub(crate) content_hash: String,
    pub(crate) summary: Option<String>,
    pub(crate) key_information: Option<String>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct EntityRow {
    pub(crate) entity_text: String,
    pub(crate) entity_type: String,
    pub(crate) start_pos: i64,
    pub(crate) end_pos: i64,
}
