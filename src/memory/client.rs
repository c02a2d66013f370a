//! HTTP client for the Mem0 REST server.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::memory::{
    config::{MemoryConfig, Secret},
    types::{MemoryError, Message},
};

/// Operations the tool handlers delegate to the memory service.
///
/// Results are returned untouched: depending on the service version they are either an object
/// with a `results` array or a bare array.
#[async_trait]
pub trait MemoryClient: Send + Sync {
    /// Extract and store memories from `messages` on behalf of `user_id`.
    async fn add(
        &self,
        messages: Vec<Message>,
        user_id: &str,
        metadata: Option<Map<String, Value>>,
    ) -> Result<Value, MemoryError>;

    /// Fetch every memory stored for `user_id`.
    async fn get_all(&self, user_id: &str) -> Result<Value, MemoryError>;

    /// Semantic search over the memories of `user_id`, returning at most `limit` hits.
    async fn search(&self, query: &str, user_id: &str, limit: usize)
    -> Result<Value, MemoryError>;
}

/// Mem0 REST server client.
pub struct Mem0Service {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<Secret>,
}

#[derive(Serialize)]
struct AddRequest<'a> {
    messages: Vec<Message>,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Map<String, Value>>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    user_id: &'a str,
    limit: usize,
}

impl Mem0Service {
    /// Construct a client for the server at `base_url`. No request is issued.
    pub fn new(base_url: &str, api_key: Option<Secret>) -> Result<Self, MemoryError> {
        let client = Client::builder()
            .user_agent(concat!("mcp-mem0/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = normalize_base_url(base_url).map_err(MemoryError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = api_key.is_some(),
            "Initialized memory service HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Install `config` on the server, replacing whatever it was running with.
    pub async fn configure(&self, config: &MemoryConfig) -> Result<(), MemoryError> {
        let response = self
            .request(Method::POST, "configure")
            .json(config)
            .send()
            .await?;
        read_json(response).await?;
        tracing::debug!(
            llm = config.llm.as_ref().map(|block| block.provider.as_str()),
            embedder = config.embedder.as_ref().map(|block| block.provider.as_str()),
            collection = %config.vector_store.config.collection_name,
            "Memory service configured"
        );
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key {
            req = req.bearer_auth(api_key.expose());
        }
        req
    }
}

#[async_trait]
impl MemoryClient for Mem0Service {
    async fn add(
        &self,
        messages: Vec<Message>,
        user_id: &str,
        metadata: Option<Map<String, Value>>,
    ) -> Result<Value, MemoryError> {
        let body = AddRequest {
            messages,
            user_id,
            metadata,
        };
        let response = self
            .request(Method::POST, "memories")
            .json(&body)
            .send()
            .await?;
        read_json(response).await
    }

    async fn get_all(&self, user_id: &str) -> Result<Value, MemoryError> {
        let response = self
            .request(Method::GET, "memories")
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        read_json(response).await
    }

    async fn search(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Value, MemoryError> {
        let response = self
            .request(Method::POST, "search")
            .json(&SearchRequest {
                query,
                user_id,
                limit,
            })
            .send()
            .await?;
        read_json(response).await
    }
}

/// Build the shared memory client: connect to the server and push `config` to it.
///
/// Failures are logged here and returned; the caller treats them as fatal.
pub async fn create_memory_client(
    base_url: &str,
    api_key: Option<Secret>,
    config: &MemoryConfig,
) -> Result<Arc<dyn MemoryClient>, MemoryError> {
    let build = async {
        let service = Mem0Service::new(base_url, api_key)?;
        service.configure(config).await?;
        Ok::<_, MemoryError>(service)
    };

    match build.await {
        Ok(service) => Ok(Arc::new(service)),
        Err(error) => {
            tracing::error!(error = %error, url = base_url, "Failed to create memory client");
            Err(error)
        }
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, MemoryError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MemoryError::UnexpectedStatus { status, body });
    }

    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(json!(null));
    }
    serde_json::from_str(&body).map_err(MemoryError::from)
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
