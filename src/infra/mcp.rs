//! MCP server surface for the bot.
//!
//! - `tools/list` advertises every registered tool with its JSON Schema
//! - `tools/call` validates arguments, runs the handler and wraps its text
//! - Bad tool names and bad arguments are JSON-RPC `invalid_params` errors;
//!   handler failures are `isError` results so the channel stays usable

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ListToolsResult, PaginatedRequestParam,
    ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};

use crate::core::params::JsonObject;
use crate::game::GameClient;
use crate::tools::registry::ToolRegistry;
use crate::tools::BotContext;

pub const SERVER_NAME: &str = "minecraft-bot";

/// The MCP server handler. Cheap to clone; every clone drives the same bot.
#[derive(Clone)]
pub struct BotSvc {
    registry: ToolRegistry,
    bot: Arc<BotContext>,
}

impl BotSvc {
    pub fn new(game: Arc<dyn GameClient>) -> Self {
        Self::with_registry(ToolRegistry::standard(), game)
    }

    pub fn with_registry(registry: ToolRegistry, game: Arc<dyn GameClient>) -> Self {
        Self {
            registry,
            bot: Arc::new(BotContext::new(game)),
        }
    }

    pub fn tool_list(&self) -> Vec<McpTool> {
        self.registry
            .list()
            .into_iter()
            .map(|meta| McpTool::new(meta.name, meta.description, Arc::new(meta.input_schema)))
            .collect()
    }

    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = name, args = ?arguments, "tool call");
        match self.registry.dispatch(self.bot.clone(), name, arguments).await {
            Ok(out) if out.is_error => Ok(CallToolResult::error(vec![Content::text(out.text)])),
            Ok(out) => Ok(CallToolResult::success(vec![Content::text(out.text)])),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "rejected tool call");
                Err(McpError::invalid_params(e.to_string(), None))
            }
        }
    }
}

impl ServerHandler for BotSvc {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = SERVER_NAME.into();
        info.server_info.version = env!("CARGO_PKG_VERSION").into();
        info.instructions = Some(
            "Controls a Minecraft bot: move, look, dig, place and find blocks, manage the \
             inventory, craft items and chat."
                .into(),
        );
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tool_list()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.invoke(&request.name, request.arguments).await
    }
}
