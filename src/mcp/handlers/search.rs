//! Handler for the `search_memories` tool.

use crate::{
    lifecycle::LifespanContext,
    mcp::format::render_memories,
    memory::DEFAULT_USER_ID,
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;

use super::{parse_arguments, text_result};

/// Number of hits requested when the caller does not say otherwise.
pub(crate) const DEFAULT_SEARCH_LIMIT: usize = 3;

/// Request payload accepted by the `search_memories` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchMemoriesRequest {
    /// Natural language query.
    pub(crate) query: String,
    /// Maximum number of hits.
    #[serde(default = "default_limit")]
    pub(crate) limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

/// Handle the `search_memories` tool with a semantic search bounded by `limit`.
pub(crate) async fn handle_search_memories(
    context: &LifespanContext,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let SearchMemoriesRequest { query, limit } = parse_arguments(arguments)?;
    if limit == 0 {
        return Err(McpError::invalid_params("limit must be at least 1", None));
    }
    tracing::debug!(limit, "Searching memories");

    let hits = context
        .memory_client
        .search(&query, DEFAULT_USER_ID, limit)
        .await
        .and_then(render_memories);
    let message = match hits {
        Ok(rendered) => rendered,
        Err(error) => {
            tracing::error!(error = ?error, "Error in search_memories");
            format!("Error searching memories: {error}")
        }
    };
    Ok(text_result(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn limit_defaults_to_three() {
        let args: SearchMemoriesRequest =
            parse_arguments(json!({ "query": "tea" }).as_object().cloned()).unwrap();
        assert_eq!(args.limit, 3);
    }

    #[test]
    fn explicit_limit_is_kept() {
        let args: SearchMemoriesRequest =
            parse_arguments(json!({ "query": "tea", "limit": 10 }).as_object().cloned())
                .unwrap();
        assert_eq!(args.limit, 10);
    }

    #[test]
    fn missing_query_is_invalid_params() {
        let error = parse_arguments::<SearchMemoriesRequest>(None).unwrap_err();
        assert_eq!(error.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }
}
