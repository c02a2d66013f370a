//! Handler for the `get_all_memories` tool.

use crate::{
    lifecycle::LifespanContext,
    mcp::format::render_memories,
    memory::DEFAULT_USER_ID,
};
use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::text_result;

/// Handle the `get_all_memories` tool, returning every stored memory as JSON text.
pub(crate) async fn handle_get_all_memories(
    context: &LifespanContext,
) -> Result<CallToolResult, McpError> {
    let listing = context
        .memory_client
        .get_all(DEFAULT_USER_ID)
        .await
        .and_then(render_memories);
    let message = match listing {
        Ok(rendered) => rendered,
        Err(error) => {
            tracing::error!(error = ?error, "Error in get_all_memories");
            format!("Error retrieving memories: {error}")
        }
    };
    Ok(text_result(message))
}
