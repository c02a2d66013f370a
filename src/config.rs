use std::env;
use std::fmt;
use thiserror::Error;

/// Default endpoint of the Mem0 REST server.
pub const DEFAULT_MEMORY_API_URL: &str = "http://127.0.0.1:8888";

/// Variables that must be present and non-empty before the server may start.
pub const REQUIRED_VARIABLES: [&str; 4] = [
    "LLM_PROVIDER",
    "LLM_API_KEY",
    "LLM_CHOICE",
    "EMBEDDING_MODEL_CHOICE",
];

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variables were not provided.
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<&'static str>),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Raw settings read from the process environment at startup.
///
/// Nothing here is validated beyond presence: provider branching happens in
/// [`crate::memory::resolve_memory_config`].
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Provider selector (`openai`, `openrouter`, `gemini`, `ollama`).
    pub llm_provider: Option<String>,
    /// API key for the selected provider.
    pub llm_api_key: Option<String>,
    /// Language-model identifier.
    pub llm_choice: Option<String>,
    /// Embedding-model identifier.
    pub embedding_model_choice: Option<String>,
    /// Optional base URL override for the provider.
    pub llm_base_url: Option<String>,
    /// Postgres connection string for the vector store.
    pub database_url: Option<String>,
    /// Endpoint of the Mem0 REST server.
    pub memory_api_url: String,
    /// Optional bearer token for the Mem0 REST server.
    pub memory_api_key: Option<String>,
    /// Whether to send the built-in fact extraction prompt.
    pub custom_instructions: bool,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary lookup function, used by tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let custom_instructions = optional("MEM0_CUSTOM_INSTRUCTIONS")
            .map(|value| parse_flag(&value).ok_or_else(|| {
                ConfigError::InvalidValue("MEM0_CUSTOM_INSTRUCTIONS".to_string())
            }))
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            llm_provider: optional("LLM_PROVIDER"),
            llm_api_key: optional("LLM_API_KEY"),
            llm_choice: optional("LLM_CHOICE"),
            embedding_model_choice: optional("EMBEDDING_MODEL_CHOICE"),
            llm_base_url: optional("LLM_BASE_URL"),
            database_url: optional("DATABASE_URL"),
            memory_api_url: optional("MEM0_API_URL")
                .unwrap_or_else(|| DEFAULT_MEMORY_API_URL.to_string()),
            memory_api_key: optional("MEM0_API_KEY"),
            custom_instructions,
        })
    }

    /// Names of required variables that are absent or empty.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let values = [
            &self.llm_provider,
            &self.llm_api_key,
            &self.llm_choice,
            &self.embedding_model_choice,
        ];
        REQUIRED_VARIABLES
            .into_iter()
            .zip(values)
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect()
    }

    /// Fail with [`ConfigError::MissingVariables`] unless every required variable is set.
    pub fn check_required(&self) -> Result<(), ConfigError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingVariables(missing))
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Wire channel the MCP server listens on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    /// Newline-delimited JSON-RPC over standard input/output.
    Stdio,
    /// HTTP event-stream transport.
    Http,
}

impl Transport {
    /// Map a `TRANSPORT` selector to a transport; anything but `stdio` selects HTTP.
    pub fn from_selector(selector: &str) -> Self {
        if selector.trim().eq_ignore_ascii_case("stdio") {
            Self::Stdio
        } else {
            Self::Http
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => f.write_str("stdio"),
            Self::Http => f.write_str("sse"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reports_every_missing_required_variable() {
        let settings = Settings::from_lookup(lookup(&[("LLM_PROVIDER", "openai")])).unwrap();
        assert_eq!(
            settings.missing_required(),
            vec!["LLM_API_KEY", "LLM_CHOICE", "EMBEDDING_MODEL_CHOICE"]
        );
        let error = settings.check_required().unwrap_err();
        assert_eq!(
            error.to_string(),
            "Missing required environment variables: LLM_API_KEY, LLM_CHOICE, EMBEDDING_MODEL_CHOICE"
        );
    }

    #[test]
    fn blank_values_count_as_missing() {
        let settings = Settings::from_lookup(lookup(&[
            ("LLM_PROVIDER", "openai"),
            ("LLM_API_KEY", "   "),
            ("LLM_CHOICE", "gpt-4o-mini"),
            ("EMBEDDING_MODEL_CHOICE", "text-embedding-3-small"),
        ]))
        .unwrap();
        assert_eq!(settings.missing_required(), vec!["LLM_API_KEY"]);
    }

    #[test]
    fn defaults_memory_endpoint_and_flags() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.memory_api_url, DEFAULT_MEMORY_API_URL);
        assert!(!settings.custom_instructions);
        assert!(settings.database_url.is_none());
    }

    #[test]
    fn rejects_unparseable_flag() {
        let error = Settings::from_lookup(lookup(&[("MEM0_CUSTOM_INSTRUCTIONS", "maybe")]))
            .unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(name) if name == "MEM0_CUSTOM_INSTRUCTIONS"));
    }

    #[test]
    fn transport_selector_defaults_to_http_for_anything_but_stdio() {
        assert_eq!(Transport::from_selector("stdio"), Transport::Stdio);
        assert_eq!(Transport::from_selector(" STDIO "), Transport::Stdio);
        assert_eq!(Transport::from_selector("sse"), Transport::Http);
        assert_eq!(Transport::from_selector("http"), Transport::Http);
    }
}
