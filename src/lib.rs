#![deny(missing_docs)]

//! Core library for Legalyze, a legal document analyzer.
//!
//! Uploaded PDF, DOCX, and TXT files are reduced to text, summarized, classified, mined for
//! key information and legal entities, stored in SQLite, and indexed for document-grounded
//! questions. The HTTP server, the MCP server, and the CLI all drive the same
//! [`processing::ProcessingService`].

/// Model-backed summary, classification, and key-information extraction.
pub mod analysis;
/// HTTP routing and REST handlers.
pub mod api;
/// Document-grounded and general legal question answering.
pub mod assistant;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Text extraction from PDF, DOCX, and TXT files.
pub mod extraction;
/// HTML highlighting and display helpers for analyzed documents.
pub mod highlight;
/// Chat-completion clients.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Analyzer metrics helpers.
pub mod metrics;
/// Legal entity recognition.
pub mod ner;
/// Document processing pipeline.
pub mod processing;
/// Qdrant HTTP integration.
pub mod qdrant;
/// SQLite persistence for documents, entities, and chat history.
pub mod storage;
/// Vector store abstraction with in-memory and Qdrant backends.
pub mod vector_store;
