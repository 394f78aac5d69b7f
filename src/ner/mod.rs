//! Legal named-entity extraction.
//!
//! Three passes run over the document: general recognizers (people, organizations, places,
//! courts, judges), legal regex patterns (citations, statutes, money, dates), and optionally a
//! model pass for parties, laws, and legal terms. Overlaps are resolved by
//! [`remove_duplicate_entities`].

pub mod dedupe;
pub mod llm;
pub mod patterns;
pub mod types;

use crate::llm::{LlmClient, LlmClientError};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

pub use dedupe::remove_duplicate_entities;
pub use types::{DEFAULT_COLOR, EntityType, LegalEntity};

/// Errors raised during entity extraction.
#[derive(Debug, Error)]
pub enum EntityExtractionError {
    /// Model pass failed to reach the provider.
    #[error("Entity recognition request failed: {0}")]
    Llm(#[from] LlmClientError),
}

/// Runs the rule-based and model-based entity passes.
#[derive(Clone)]
pub struct EntityExtractor {
    llm: Option<Arc<dyn LlmClient>>,
}

impl EntityExtractor {
    /// Extractor that also queries `llm` for legal entities.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm: Some(llm) }
    }

    /// Extractor limited to the rule-based passes.
    pub fn rules_only() -> Self {
        Self { llm: None }
    }

    /// Extract and deduplicate entities from `text`.
    pub async fn extract_legal_entities(
        &self,
        text: &str,
    ) -> Result<Vec<LegalEntity>, EntityExtractionError> {
        let started = Instant::now();
        let mut entities = patterns::general_entities(text);
        entities.extend(patterns::legal_pattern_entities(text));
        let rule_count = entities.len();

        let mut model_count = 0;
        if let Some(llm) = &self.llm {
            let found = llm::extract_with_llm(llm.as_ref(), text).await?;
            model_count = found.len();
            entities.extend(found);
        }

        let unique = remove_duplicate_entities(entities);
        tracing::debug!(
            rule_matches = rule_count,
            model_matches = model_count,
            entities = unique.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Entities extracted"
        );
        Ok(unique)
    }
}
