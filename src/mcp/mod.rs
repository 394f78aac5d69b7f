//! Model Context Protocol (MCP) integration for Legalyze.
//!
//! This module wires the processing pipeline into an MCP server so editors and agent hosts can
//! analyze legal documents and ask questions about them over stdio. The surface area consists of:
//!
//! - Tools: `analyze-document`, `ask-document`, `legal-information`, `list-documents`,
//!   `get-document`, `delete-document`, `chat-history`, and `metrics`.
//! - Resources: `mcp://entity-types`, `mcp://health`, and `mcp://usage`.
//!
//! Handlers, schemas, and formatting helpers are kept in focused submodules to make tests and
//! reviews small and targeted.

mod format;
mod handlers;
mod registry;
mod schemas;
mod server;

pub use server::LegalyzeMcpServer;
