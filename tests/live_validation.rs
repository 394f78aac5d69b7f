//! Checks against live providers. Run with `cargo test -- --ignored` after exporting the
//! same environment the servers use.

use std::sync::Once;

use legalyze::{
    config, embedding,
    llm::{self, CompletionRequest},
    processing::ProcessingService,
};

static INIT: Once = Once::new();

fn init_config_once() {
    INIT.call_once(|| {
        config::init_config().expect("configuration must load from the environment");
    });
}

#[tokio::test]
#[ignore = "Requires a live chat model"]
async fn live_chat_completion() {
    init_config_once();
    let client = llm::get_llm_client().expect("chat client");
    let reply = client
        .complete(CompletionRequest::new("Reply with the single word: ready", 0.0, 10))
        .await
        .expect("completion");
    assert!(!reply.trim().is_empty());
}

#[tokio::test]
#[ignore = "Requires a live embedding provider"]
async fn live_embedding_roundtrip() {
    init_config_once();
    let client = embedding::get_embedding_client().expect("embedding client");
    let vectors = client
        .generate_embeddings(vec!["The lessee shall pay rent monthly.".to_string()])
        .await
        .expect("failed to request embeddings from provider");
    assert_eq!(vectors.len(), 1, "expected embedding per input chunk");
    let dimension = config::get_config().embedding_dimension;
    assert_eq!(vectors[0].len(), dimension, "embedding dimension mismatch");
}

#[tokio::test]
#[ignore = "Requires a live chat model, embeddings, and vector store"]
async fn live_analyze_ask_and_delete() {
    init_config_once();
    let service = ProcessingService::new().await.expect("processing service");
    let health = service.health().await;
    assert!(health.database_reachable, "database unreachable: {health:?}");

    let report = service
        .analyze_text(
            "live-lease.txt",
            "RESIDENTIAL LEASE. Landlord leases the premises to Tenant for twelve months \
             at $1,800 per month, due on the first day of each month."
                .to_string(),
        )
        .await
        .expect("analysis");
    assert!(!report.analysis.summary.is_empty());

    let answer = service
        .ask(report.document_id, "What is the monthly rent?")
        .await
        .expect("answer");
    assert!(!answer.answer.is_empty());

    service
        .delete_document(report.document_id)
        .await
        .expect("delete");
}
