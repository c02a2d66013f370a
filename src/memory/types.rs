//! Shared types used by the memory client and the tool handlers.

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Errors returned while talking to the memory service.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid memory service URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service responded with an unexpected status code.
    #[error("Unexpected memory service response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Response body was not valid JSON.
    #[error("Malformed memory service response: {0}")]
    Decode(#[from] serde_json::Error),
    /// A listed entry carried no `memory` text.
    #[error("Memory entry has no 'memory' field")]
    MissingMemoryField,
}

/// Chat message handed to the memory service for fact extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Speaker role (`user`, `assistant`).
    pub role: String,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Message authored by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}
