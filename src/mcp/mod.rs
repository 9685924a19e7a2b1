//! MCP (Model Context Protocol) server implementation using rmcp.
//!
//! The server provides the `echo` tool and the Perplexity search tools.

mod handlers;
mod server;
mod tools;
pub mod types;

pub use handlers::run_mcp_server;
