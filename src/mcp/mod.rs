//! MCP (Model Context Protocol) server implementation
//!
//! Exposes the audit tools over stdio for editor and agent integration.

mod server;
mod tools;
mod types;

pub use server::McpServer;
pub use types::{McpError, McpRequest, McpResponse};
