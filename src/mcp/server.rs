//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    config::CONFIG,
    mcp::{
        format::{
            entity_types_payload, health_payload, json_resource_contents, serialize_json,
            usage_payload,
        },
        handlers::{
            chat::{handle_ask, handle_chat_history, handle_legal_information},
            documents::{handle_analyze, handle_delete, handle_get, handle_list},
            metrics::handle_metrics,
        },
        registry, schemas,
    },
    processing::ProcessingApi,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, JsonObject, ListResourcesResult,
        ListToolsResult, RawResource, ReadResourceRequestParam, ReadResourceResult, Resource,
        ServerCapabilities, ServerInfo, Tool, ToolAnnotations,
    },
};

const ENTITY_TYPES_URI: &str = "mcp://entity-types";
const HEALTH_URI: &str = "mcp://health";
const USAGE_URI: &str = "mcp://usage";

/// MCP server implementation exposing Legalyze document operations.
#[derive(Clone)]
pub struct LegalyzeMcpServer {
    processing: Arc<dyn ProcessingApi>,
    registry: Arc<registry::Registry>,
}

impl LegalyzeMcpServer {
    /// Create a new MCP server using the supplied processing pipeline.
    pub fn new(processing: Arc<dyn ProcessingApi>) -> Self {
        let mut registry = registry::Registry::new();
        registry.register_resource(ENTITY_TYPES_URI, resource_entity_types);
        registry.register_resource(HEALTH_URI, resource_health);
        registry.register_resource(USAGE_URI, resource_usage);

        registry.register_tool("analyze-document", tool_analyze_document);
        registry.register_tool("ask-document", tool_ask_document);
        registry.register_tool("legal-information", tool_legal_information);
        registry.register_tool("list-documents", tool_list_documents);
        registry.register_tool("get-document", tool_get_document);
        registry.register_tool("delete-document", tool_delete_document);
        registry.register_tool("chat-history", tool_chat_history);
        registry.register_tool("metrics", tool_metrics);

        Self {
            processing,
            registry: Arc::new(registry),
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        vec![
            tool(
                "analyze-document",
                "Analyze Legal Document",
                "Summarize, classify, and extract key information and entities from a PDF, DOCX, or TXT file (or inline text), then store it for questions.",
                schemas::analyze_document_input_schema(),
                ToolAnnotations::with_title("Analyze Legal Document")
                    .destructive(false)
                    .idempotent(false)
                    .open_world(true),
            ),
            tool(
                "ask-document",
                "Ask About Document",
                "Answer a question from the stored document's most relevant passages and record the exchange.",
                schemas::ask_document_input_schema(),
                ToolAnnotations::with_title("Ask About Document")
                    .destructive(false)
                    .idempotent(false)
                    .open_world(true),
            ),
            tool(
                "legal-information",
                "General Legal Information",
                "Explain a legal concept in general terms; the answer is not legal advice.",
                schemas::legal_information_input_schema(),
                ToolAnnotations::with_title("General Legal Information")
                    .read_only(true)
                    .open_world(true),
            ),
            tool(
                "list-documents",
                "List Documents",
                "List saved documents, newest first, to find a document_id.",
                schemas::list_documents_input_schema(),
                ToolAnnotations::with_title("List Documents")
                    .read_only(true)
                    .idempotent(true)
                    .open_world(false),
            ),
            tool(
                "get-document",
                "Get Document",
                "Return a stored document's type, summary, key information, and entities.",
                schemas::get_document_input_schema(),
                ToolAnnotations::with_title("Get Document")
                    .read_only(true)
                    .idempotent(true)
                    .open_world(false),
            ),
            tool(
                "delete-document",
                "Delete Document",
                "Delete a document together with its entities, chat history, and vectors.",
                schemas::document_id_input_schema(),
                ToolAnnotations::with_title("Delete Document")
                    .destructive(true)
                    .idempotent(true)
                    .open_world(false),
            ),
            tool(
                "chat-history",
                "Chat History",
                "Return recent questions and answers for a document, newest first.",
                schemas::chat_history_input_schema(),
                ToolAnnotations::with_title("Chat History")
                    .read_only(true)
                    .idempotent(true)
                    .open_world(false),
            ),
            tool(
                "metrics",
                "Metrics Snapshot",
                "Check analysis volume and question counts at a glance.",
                schemas::empty_object_schema(),
                ToolAnnotations::with_title("Metrics Snapshot")
                    .read_only(true)
                    .idempotent(true)
                    .open_world(false),
            ),
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut entity_types = RawResource::new(ENTITY_TYPES_URI, "entity-types");
        entity_types.description =
            Some("Recognized entity types with highlight colors and overlap priority".into());

        let mut health = RawResource::new(HEALTH_URI, "health");
        health.description =
            Some("Database reachability, active providers, and analyzer counters".into());

        let mut usage = RawResource::new(USAGE_URI, "usage");
        usage.description = Some(
            "Recommended tool flow: analyze-document once, then ask-document with the returned id."
                .into(),
        );

        vec![
            entity_types.no_annotation(),
            health.no_annotation(),
            usage.no_annotation(),
        ]
    }
}

fn tool(
    name: &'static str,
    title: &str,
    description: &'static str,
    schema: JsonObject,
    annotations: ToolAnnotations,
) -> Tool {
    Tool {
        name: Cow::Borrowed(name),
        title: Some(title.to_string()),
        description: Some(Cow::Borrowed(description)),
        input_schema: Arc::new(schema),
        output_schema: None,
        annotations: Some(annotations),
        icons: None,
    }
}

fn resource_entity_types(
    _server: &LegalyzeMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                ENTITY_TYPES_URI,
                serialize_json(&entity_types_payload(), ENTITY_TYPES_URI),
            )],
        })
    })
}

fn resource_health(
    server: &LegalyzeMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let processing = server.processing.clone();
    Box::pin(async move {
        let snapshot = processing.health().await;
        let payload = health_payload(&snapshot, &processing.metrics_snapshot(), CONFIG.get());
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                HEALTH_URI,
                serialize_json(&payload, HEALTH_URI),
            )],
        })
    })
}

fn resource_usage(
    _server: &LegalyzeMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                USAGE_URI,
                serialize_json(&usage_payload(), USAGE_URI),
            )],
        })
    })
}

fn tool_analyze_document(
    server: &LegalyzeMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let processing = server.processing.clone();
    Box::pin(async move { handle_analyze(&processing, request.arguments).await })
}

fn tool_ask_document(
    server: &LegalyzeMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let processing = server.processing.clone();
    Box::pin(async move { handle_ask(&processing, request.arguments).await })
}

fn tool_legal_information(
    server: &LegalyzeMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let processing = server.processing.clone();
    Box::pin(async move { handle_legal_information(&processing, request.arguments).await })
}

fn tool_list_documents(
    server: &LegalyzeMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let processing = server.processing.clone();
    Box::pin(async move { handle_list(&processing, request.arguments).await })
}

fn tool_get_document(
    server: &LegalyzeMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let processing = server.processing.clone();
    Box::pin(async move { handle_get(&processing, request.arguments).await })
}

fn tool_delete_document(
    server: &LegalyzeMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let processing = server.processing.clone();
    Box::pin(async move { handle_delete(&processing, request.arguments).await })
}

fn tool_chat_history(
    server: &LegalyzeMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let processing = server.processing.clone();
    Box::pin(async move { handle_chat_history(&processing, request.arguments).await })
}

fn tool_metrics(server: &LegalyzeMcpServer, _request: CallToolRequestParam) -> registry::ToolFuture {
    let processing = server.processing.clone();
    Box::pin(async move { handle_metrics(&processing).await })
}

impl ServerHandler for LegalyzeMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "legalyze".to_string();
        implementation.title = Some("Legalyze MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use this server to analyze legal documents and answer questions about them. Analyze a file or text once, then ask questions with the returned document id; answers are general information, not legal advice.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.resources.get(request.uri.as_str()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {}", request.uri),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.tools.get(request.name.as_ref()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ))
        }
    }
}
