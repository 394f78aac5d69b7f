//! Legal chatbot: document-grounded answers and general legal information.

use crate::{
    analysis::DocumentAnalysis,
    highlight::display_value,
    llm::{CompletionRequest, LlmClient, LlmClientError},
};
use serde_json::Value;
use std::sync::Arc;

/// System message framing every document-grounded answer.
pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are a legal assistant specializing in document \
    analysis and legal research. Provide clear, accurate and helpful responses to questions about \
    legal documents.";

/// Answers questions with a chat model.
#[derive(Clone)]
pub struct LegalAssistant {
    llm: Arc<dyn LlmClient>,
}

/// Render the analysis block included in chatbot prompts.
///
/// Lists the document type and its explanation, then each key-information entry as a bullet.
/// Nested objects become indented bullets.
pub fn build_document_info(analysis: &DocumentAnalysis) -> String {
    let mut info = String::new();
    info.push_str(&format!(
        "Document Type: {}\n",
        analysis.document_type.label
    ));
    info.push_str(&format!(
        "Document Type Explanation: {}\n\n",
        analysis.document_type.explanation.as_deref().unwrap_or_default()
    ));

    if !analysis.key_information.is_empty() {
        info.push_str("Document Key Information:\n");
        for (key, value) in &analysis.key_information {
            match value {
                Value::Object(nested) => {
                    info.push_str(&format!("- {key}:\n"));
                    for (sub_key, sub_value) in nested {
                        info.push_str(&format!("  - {sub_key}: {}\n", display_value(sub_value)));
                    }
                }
                other => info.push_str(&format!("- {key}: {}\n", display_value(other))),
            }
        }
    }
    info
}

fn chatbot_prompt(question: &str, context: &str, document_info: &str) -> String {
    format!(
        "You are a legal assistant specializing in document analysis and legal research.\n\n\
         Document Context:\n{context}\n\n\
         {document_info}\n\n\
         User Question: {question}\n\n\
         Please provide a detailed and accurate response to the user's question based on the \
         document context. If the answer cannot be determined from the provided context, \
         acknowledge this limitation and provide general legal information that might still be \
         helpful. Cite specific sections or clauses from the document when relevant."
    )
}

fn legal_information_prompt(query: &str) -> String {
    format!(
        "You are a legal assistant with expertise in various legal domains.\n\n\
         User Query: {query}\n\n\
         Please provide helpful general legal information related to this query. Make it clear \
         that this is general information and not specific legal advice. Include a disclaimer \
         about consulting a qualified attorney for specific legal matters."
    )
}

impl LegalAssistant {
    /// Create an assistant backed by the given model client.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Answer `question` from retrieved `context` and, when present, the stored analysis.
    pub async fn get_chatbot_response(
        &self,
        question: &str,
        context: &str,
        analysis: Option<&DocumentAnalysis>,
    ) -> Result<String, LlmClientError> {
        let document_info = analysis.map(build_document_info).unwrap_or_default();
        let request = CompletionRequest::new(
            chatbot_prompt(question, context, &document_info),
            0.2,
            1000,
        )
        .with_system(ASSISTANT_SYSTEM_PROMPT);
        self.llm.complete(request).await
    }

    /// Answer a general legal question with a not-legal-advice disclaimer.
    pub async fn get_legal_information(&self, query: &str) -> Result<String, LlmClientError> {
        let request = CompletionRequest::new(legal_information_prompt(query), 0.3, 800);
        self.llm.complete(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DocumentType;
    use crate::llm::testing::ScriptedLlm;
    use serde_json::json;

    fn analysis() -> DocumentAnalysis {
        DocumentAnalysis {
            summary: "A lease.".into(),
            document_type: DocumentType {
                label: "Residential Lease".into(),
                explanation: Some("Landlord and tenant terms.".into()),
            },
            key_information: json!({
                "parties": {"landlord": "Ann Lee", "tenant": "Bo Kim"},
                "rent": "$1,200 per month"
            })
            .as_object()
            .cloned()
            .expect("object"),
        }
    }

    #[test]
    fn document_info_lists_type_and_nested_key_information() {
        let info = build_document_info(&analysis());
        assert!(info.starts_with(
            "Document Type: Residential Lease\nDocument Type Explanation: Landlord and tenant terms.\n\n"
        ));
        assert!(info.contains("Document Key Information:\n"));
        assert!(info.contains("- parties:\n  - landlord: Ann Lee\n  - tenant: Bo Kim\n"));
        assert!(info.contains("- rent: $1,200 per month\n"));
    }

    #[tokio::test]
    async fn chatbot_request_carries_context_question_and_system_message() {
        let llm = ScriptedLlm::sequence(&["The rent is $1,200 per month (Section 3)."]);
        let assistant = LegalAssistant::new(llm.clone());

        let answer = assistant
            .get_chatbot_response("What is the rent?", "Section 3. Rent.", Some(&analysis()))
            .await
            .expect("answer");

        assert!(answer.contains("Section 3"));
        let request = &llm.requests()[0];
        assert_eq!(request.system.as_deref(), Some(ASSISTANT_SYSTEM_PROMPT));
        assert!(request.prompt.contains("Document Context:\nSection 3. Rent."));
        assert!(request.prompt.contains("User Question: What is the rent?"));
        assert!(request.prompt.contains("Document Type: Residential Lease"));
        assert_eq!(request.max_tokens, 1000);
    }

    #[tokio::test]
    async fn legal_information_has_no_system_message() {
        let llm = ScriptedLlm::sequence(&["General information only."]);
        let assistant = LegalAssistant::new(llm.clone());

        assistant
            .get_legal_information("What is adverse possession?")
            .await
            .expect("answer");

        let request = &llm.requests()[0];
        assert!(request.system.is_none());
        assert!(request.prompt.contains("User Query: What is adverse possession?"));
        assert!(request.prompt.contains("qualified attorney"));
        assert_eq!(request.max_tokens, 800);
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
    }
}
