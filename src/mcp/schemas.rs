//! JSON schema builders for MCP tools.

use serde_json::{Map, Value, json};

use super::handlers::search::DEFAULT_SEARCH_LIMIT;

/// Build the schema describing the `save_memory` tool input.
pub(crate) fn save_memory_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "text".into(),
        string_schema("Information to remember; the memory service extracts facts from it"),
    );

    let mut metadata_schema = Map::new();
    metadata_schema.insert("type".into(), Value::String("object".into()));
    metadata_schema.insert(
        "description".into(),
        Value::String("Optional key/value metadata stored alongside the memory".into()),
    );
    properties.insert("metadata".into(), Value::Object(metadata_schema));

    let mut schema = finalize_object_schema(properties, &["text"]);
    schema.insert(
        "examples".into(),
        Value::Array(vec![json!({
            "text": "The deploy pipeline runs from the release branch every Friday."
        })]),
    );
    schema
}

/// Build the schema describing the `search_memories` tool input.
pub(crate) fn search_memories_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "query".into(),
        string_schema("Natural language query matched semantically against stored memories"),
    );

    let mut limit_schema = Map::new();
    limit_schema.insert("type".into(), Value::String("integer".into()));
    limit_schema.insert(
        "description".into(),
        Value::String("Maximum number of memories to return".into()),
    );
    limit_schema.insert("minimum".into(), Value::Number(1.into()));
    limit_schema.insert(
        "default".into(),
        Value::Number(serde_json::Number::from(DEFAULT_SEARCH_LIMIT as u64)),
    );
    properties.insert("limit".into(), Value::Object(limit_schema));

    finalize_object_schema(properties, &["query"])
}

/// Schema representing an empty object (used for parameterless tools).
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    finalize_object_schema(Map::new(), &[])
}

fn string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_schema_requires_query_and_defaults_limit() {
        let schema = search_memories_input_schema();
        assert_eq!(schema["required"], json!(["query"]));
        assert_eq!(schema["properties"]["limit"]["default"], 3);
    }

    #[test]
    fn empty_schema_has_no_required_list() {
        let schema = empty_object_schema();
        assert!(!schema.contains_key("required"));
        assert_eq!(schema["additionalProperties"], false);
    }
}
