#![deny(missing_docs)]

//! Core library for the Mem0 MCP memory server.

/// Environment-driven settings.
pub mod config;
/// Postgres reachability probe.
pub mod database;
/// Startup, serving, and shutdown orchestration.
pub mod lifecycle;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Mem0 configuration and client.
pub mod memory;
