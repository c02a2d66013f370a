//! Mem0 integration: configuration document, client trait, and HTTP adapter.

pub mod client;
pub mod config;
pub mod types;

pub use client::{Mem0Service, MemoryClient, create_memory_client};
pub use config::{LlmProvider, MemoryConfig, ResolvedConfig, Secret, resolve_memory_config};
pub use types::{MemoryError, Message};

/// Owner identifier every memory is stored under.
pub const DEFAULT_USER_ID: &str = "user";
