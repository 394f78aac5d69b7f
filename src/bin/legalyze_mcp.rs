//! MCP server entrypoint (stdio transport).
//!
//! Launches an MCP server that exposes Legalyze's tools and resources over stdio for editor and
//! agent integrations. Logs go to stderr and the log file; stdout carries protocol frames.
use anyhow::{Context, Result};
use legalyze::{
    config,
    logging::{self, ConsoleTarget},
    mcp::LegalyzeMcpServer,
    processing,
};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config().context("failed to load configuration")?;
    logging::init_tracing_with(ConsoleTarget::Stderr);

    let processing = processing::ProcessingService::new()
        .await
        .context("failed to initialize processing service")?;
    let server = LegalyzeMcpServer::new(Arc::new(processing));

    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    service
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}
