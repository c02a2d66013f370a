//! Model Context Protocol (MCP) surface of the memory server.
//!
//! - Tools: `save_memory`, `get_all_memories`, `search_memories`.
//! - Resources: `mcp://settings`, the effective (credential-free) memory configuration.
//!
//! Every handler reaches the memory service through the [`LifespanContext`] the server was
//! built with.
//!
//! [`LifespanContext`]: crate::lifecycle::LifespanContext

mod format;
pub mod handlers;
mod schemas;
mod server;

pub use format::SettingsSnapshot;
pub use server::Mem0McpServer;
