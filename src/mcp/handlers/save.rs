//! Handler for the `save_memory` tool.

use crate::{
    lifecycle::LifespanContext,
    mcp::format::saved_message,
    memory::{DEFAULT_USER_ID, MemoryError, Message},
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;

use super::{parse_arguments, text_result};

/// Request payload accepted by the `save_memory` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct SaveMemoryRequest {
    /// Text to remember.
    pub(crate) text: String,
    /// Optional metadata stored with the memory.
    #[serde(default)]
    pub(crate) metadata: Option<JsonObject>,
}

/// Handle the `save_memory` tool by adding the text as a user message.
pub(crate) async fn handle_save_memory(
    context: &LifespanContext,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: SaveMemoryRequest = parse_arguments(arguments)?;
    let message = match save(context, args).await {
        Ok(message) => message,
        Err(error) => {
            tracing::error!(error = ?error, "Error in save_memory");
            format!("Error saving memory: {error}")
        }
    };
    Ok(text_result(message))
}

async fn save(context: &LifespanContext, args: SaveMemoryRequest) -> Result<String, MemoryError> {
    let SaveMemoryRequest { text, metadata } = args;
    context
        .memory_client
        .add(vec![Message::user(text.as_str())], DEFAULT_USER_ID, metadata)
        .await?;
    tracing::info!(chars = text.chars().count(), "Memory saved");
    Ok(saved_message(&text))
}
