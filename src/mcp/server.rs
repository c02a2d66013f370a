//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    lifecycle::LifespanContext,
    mcp::{
        format::{SettingsSnapshot, json_resource_contents, serialize_json},
        handlers::{
            list::handle_get_all_memories, save::handle_save_memory,
            search::handle_search_memories,
        },
        schemas,
    },
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourcesResult, ListToolsResult,
        RawResource, ReadResourceRequestParam, ReadResourceResult, Resource, ServerCapabilities,
        ServerInfo, Tool, ToolAnnotations,
    },
};

const SETTINGS_URI: &str = "mcp://settings";

const SAVE_MEMORY: &str = "save_memory";
const GET_ALL_MEMORIES: &str = "get_all_memories";
const SEARCH_MEMORIES: &str = "search_memories";

/// MCP server exposing long-term memory tools backed by the shared memory client.
///
/// The tool set is fixed, so requests are dispatched by name without a lookup table.
#[derive(Clone)]
pub struct Mem0McpServer {
    context: Arc<LifespanContext>,
    settings: Arc<SettingsSnapshot>,
}

impl Mem0McpServer {
    /// Create a server that serves every request from `context`.
    pub fn new(context: Arc<LifespanContext>, settings: SettingsSnapshot) -> Self {
        Self {
            context,
            settings: Arc::new(settings),
        }
    }

    async fn dispatch_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, McpError> {
        let context = self.context.as_ref();
        match request.name.as_ref() {
            SAVE_MEMORY => handle_save_memory(context, request.arguments).await,
            GET_ALL_MEMORIES => handle_get_all_memories(context).await,
            SEARCH_MEMORIES => handle_search_memories(context, request.arguments).await,
            unknown => Err(McpError::invalid_params(
                format!("Unknown tool: {unknown}"),
                None,
            )),
        }
    }

    fn read_settings(&self) -> ReadResourceResult {
        ReadResourceResult {
            contents: vec![json_resource_contents(
                SETTINGS_URI,
                serialize_json(self.settings.as_ref(), SETTINGS_URI),
            )],
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: Cow::Borrowed(SAVE_MEMORY),
                title: Some("Save Memory".to_string()),
                description: Some(Cow::Borrowed(
                    "Save information to your long-term memory. Pass any text worth recalling later; the memory service extracts and stores the facts.",
                )),
                input_schema: Arc::new(schemas::save_memory_input_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Save Memory")
                        .destructive(false)
                        .idempotent(false)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(GET_ALL_MEMORIES),
                title: Some("Get All Memories".to_string()),
                description: Some(Cow::Borrowed(
                    "Get all stored memories for the user. Use it when you need the complete context.",
                )),
                input_schema: Arc::new(schemas::empty_object_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Get All Memories")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(SEARCH_MEMORIES),
                title: Some("Search Memories".to_string()),
                description: Some(Cow::Borrowed(
                    "Search memories using semantic search. Returns the memories closest to the query, three by default.",
                )),
                input_schema: Arc::new(schemas::search_memories_input_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Search Memories")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut settings = RawResource::new(SETTINGS_URI, "settings");
        settings.description =
            Some("Language model, embedder and vector store the memories use".into());
        settings.mime_type = Some(super::format::APPLICATION_JSON.into());

        vec![settings.no_annotation()]
    }
}

impl ServerHandler for Mem0McpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "mcp-mem0".to_string();
        implementation.title = Some("Mem0 Memory MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "MCP server for long term memory storage and retrieval with Mem0. Save facts with save_memory, recall them with search_memories, or dump everything with get_all_memories.".into(),
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
        let result = if request.uri == SETTINGS_URI {
            Ok(self.read_settings())
        } else {
            Err(McpError::invalid_params(
                format!("Unknown resource URI: {}", request.uri),
                None,
            ))
        };
        std::future::ready(result)
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        self.dispatch_tool(request)
    }
}
