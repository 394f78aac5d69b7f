//! Shared fixtures: an OpenAI-shaped model mock and a fully offline processing service.

use std::sync::Arc;

use httpmock::{Method::POST, Mock, MockServer};
use legalyze::{
    embedding::HashingEmbeddingClient,
    llm::OpenAiChatClient,
    processing::{ProcessingService, ServiceComponents, UploadWorkspace, chunking::ChunkingOptions},
    storage::Database,
    vector_store::InMemoryVectorStore,
};
use serde_json::json;

pub const CONTRACT: &str = "CONSULTING AGREEMENT\n\n\
    This Consulting Agreement is entered into by Acme Widgets, Inc. and Mr. John Smith.\n\n\
    1. Fees. Client shall pay $4,500.00 per month, invoiced on January 15, 2025.\n\n\
    2. Governing Law. This agreement is governed by the laws of the State of Delaware, \
    consistent with 42 U.S.C. § 1983 and Marbury v. Madison.\n\n\
    3. Termination. Either party may terminate with thirty days written notice.";

pub const CHAT_ANSWER: &str = "Either party may terminate with thirty days written notice (Section 3).";

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// Register one chat-completion mock per prompt family.
pub async fn mock_model(server: &MockServer) -> Vec<Mock<'_>> {
    let routes: [(&str, String); 6] = [
        (
            "Summarize the following",
            "A consulting agreement setting monthly fees and termination terms.".to_string(),
        ),
        (
            "Identify the specific type",
            json!({
                "document_type": "Consulting Agreement",
                "explanation": "Defines consulting services, fees, and termination."
            })
            .to_string(),
        ),
        (
            "You are analyzing a",
            json!({
                "parties": { "client": "Acme Widgets, Inc.", "consultant": "John Smith" },
                "fee": "$4,500.00 per month",
                "governing_law": "Delaware"
            })
            .to_string(),
        ),
        (
            "Extract and identify legal entities",
            json!({ "entities": [
                { "text": "Consulting Agreement", "type": "LEGAL_TERM" },
                { "text": "Acme Widgets", "type": "PARTY" }
            ]})
            .to_string(),
        ),
        ("User Question:", CHAT_ANSWER.to_string()),
        (
            "User Query:",
            "This is general information, not legal advice. Consult a qualified attorney."
                .to_string(),
        ),
    ];

    let mut mocks = Vec::with_capacity(routes.len());
    for (needle, reply) in routes {
        let body = completion(&reply);
        mocks.push(
            server
                .mock_async(move |when, then| {
                    when.method(POST)
                        .path("/chat/completions")
                        .header("authorization", "Bearer sk-test")
                        .body_contains(needle);
                    then.status(200).json_body(body);
                })
                .await,
        );
    }
    mocks
}

/// Build a processing service whose model calls go to `server`.
pub async fn offline_service(server: &MockServer, dir: &tempfile::TempDir) -> ProcessingService {
    let llm = OpenAiChatClient::new(server.base_url(), "sk-test".into(), "gpt-4o".into())
        .expect("chat client");
    let database = Database::setup("sqlite::memory:").await.expect("database");
    ProcessingService::from_parts(ServiceComponents {
        llm: Arc::new(llm),
        embedding: Arc::new(HashingEmbeddingClient::new(64)),
        vector_store: Arc::new(InMemoryVectorStore::new()),
        database,
        workspace: UploadWorkspace::prepare(dir.path().join("uploads")).expect("workspace"),
        chunking: ChunkingOptions::characters(120, 20),
        top_k: 3,
        ner_use_llm: true,
    })
}
