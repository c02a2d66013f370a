//! Formatting helpers shared across MCP handlers and resources.

use crate::memory::{DEFAULT_USER_ID, MemoryConfig, MemoryError};
use rmcp::model::ResourceContents;
use serde::Serialize;
use serde_json::Value;

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Number of characters of the saved text echoed back to the caller.
pub(crate) const SAVE_ECHO_LIMIT: usize = 100;

/// Confirmation returned by `save_memory`; long inputs are cut at [`SAVE_ECHO_LIMIT`]
/// characters and marked with `...`.
pub(crate) fn saved_message(text: &str) -> String {
    match text.char_indices().nth(SAVE_ECHO_LIMIT) {
        Some((cut, _)) => format!("Successfully saved memory: {}...", &text[..cut]),
        None => format!("Successfully saved memory: {text}"),
    }
}

/// Reduce a memory service response to the list of memory texts.
///
/// Objects carrying a `results` array are projected onto each entry's `memory` field; anything
/// else is returned unchanged. An entry without that field fails the whole listing.
pub(crate) fn flatten_memories(response: Value) -> Result<Value, MemoryError> {
    match response {
        Value::Object(mut map) if map.contains_key("results") => match map.remove("results") {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .map(|mut entry| {
                    entry
                        .get_mut("memory")
                        .map(Value::take)
                        .ok_or(MemoryError::MissingMemoryField)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Some(other) => Ok(other),
            None => Ok(Value::Null),
        },
        other => Ok(other),
    }
}

/// Render memories as two-space indented JSON.
pub(crate) fn render_memories(response: Value) -> Result<String, MemoryError> {
    flatten_memories(response).map(|memories| serialize_json(&memories, "memories"))
}

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(context, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "null".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}

/// Effective memory settings exposed through the `settings` resource. Carries no credentials.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsSnapshot {
    /// Language-model provider, when one was resolved.
    pub llm_provider: Option<String>,
    /// Language-model identifier.
    pub llm_model: Option<String>,
    /// Embedding provider, when one was resolved.
    pub embedder_provider: Option<String>,
    /// Embedding model identifier.
    pub embedding_model: Option<String>,
    /// Width of stored vectors.
    pub embedding_dims: u32,
    /// Vector store collection.
    pub collection: String,
    /// Owner identifier memories are stored under.
    pub user_id: String,
}

impl SettingsSnapshot {
    /// Capture the non-sensitive parts of `config`.
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self {
            llm_provider: config.llm.as_ref().map(|block| block.provider.clone()),
            llm_model: config.llm.as_ref().map(|block| block.config.model.clone()),
            embedder_provider: config.embedder.as_ref().map(|block| block.provider.clone()),
            embedding_model: config
                .embedder
                .as_ref()
                .map(|block| block.config.model.clone()),
            embedding_dims: config.vector_store.config.embedding_model_dims,
            collection: config.vector_store.config.collection_name.clone(),
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Settings, memory::resolve_memory_config};
    use serde_json::json;

    #[test]
    fn short_text_is_echoed_whole() {
        assert_eq!(saved_message("hello"), "Successfully saved memory: hello");
    }

    #[test]
    fn exactly_one_hundred_characters_is_not_truncated() {
        let text = "a".repeat(100);
        assert_eq!(saved_message(&text), format!("Successfully saved memory: {text}"));
    }

    #[test]
    fn long_text_is_truncated_with_marker() {
        let text = format!("{}b", "a".repeat(100));
        assert_eq!(
            saved_message(&text),
            format!("Successfully saved memory: {}...", "a".repeat(100))
        );
    }

    #[test]
    fn truncation_respects_multibyte_characters() {
        let text = "é".repeat(150);
        let message = saved_message(&text);
        assert!(message.ends_with("..."));
        let echoed = message
            .trim_start_matches("Successfully saved memory: ")
            .trim_end_matches("...");
        assert_eq!(echoed.chars().count(), 100);
    }

    #[test]
    fn results_object_is_flattened_in_order() {
        let response = json!({
            "results": [
                { "id": "1", "memory": "Likes tea", "user_id": "user" },
                { "id": "2", "memory": "Works remotely", "user_id": "user" }
            ],
            "relations": []
        });
        assert_eq!(
            flatten_memories(response).expect("flattened"),
            json!(["Likes tea", "Works remotely"])
        );
    }

    #[test]
    fn entries_without_memory_fail_the_listing() {
        let response = json!({ "results": [{ "id": "1", "memory": "Likes tea" }, { "id": "2" }] });
        assert!(matches!(
            flatten_memories(response),
            Err(MemoryError::MissingMemoryField)
        ));
    }

    #[test]
    fn plain_list_passes_through() {
        let response = json!([{ "memory": "Likes tea", "score": 0.9 }]);
        assert_eq!(flatten_memories(response.clone()).expect("unchanged"), response);
    }

    #[test]
    fn object_without_results_passes_through() {
        let response = json!({ "message": "ok" });
        assert_eq!(flatten_memories(response.clone()).expect("unchanged"), response);
    }

    #[test]
    fn rendering_uses_two_space_indent() {
        let rendered =
            render_memories(json!({ "results": [{ "memory": "Likes tea" }] })).expect("rendered");
        assert_eq!(rendered, "[\n  \"Likes tea\"\n]");
    }

    #[test]
    fn settings_snapshot_omits_credentials() {
        let settings = Settings {
            llm_provider: Some("openai".into()),
            llm_api_key: Some("sk-hidden".into()),
            llm_choice: Some("gpt-4o-mini".into()),
            embedding_model_choice: Some("text-embedding-3-small".into()),
            database_url: Some("postgresql://u:p@db/postgres".into()),
            ..Settings::default()
        };
        let snapshot = SettingsSnapshot::from_config(&resolve_memory_config(&settings).memory);
        let rendered = serialize_json(&snapshot, "settings");
        assert!(!rendered.contains("sk-hidden"));
        assert!(!rendered.contains("u:p@db"));
        assert_eq!(snapshot.embedding_dims, 1536);
        assert_eq!(snapshot.user_id, "user");
        assert_eq!(snapshot.llm_provider.as_deref(), Some("openai"));
    }
}
