//! MCP tool implementations.
//!
//! Each tool is implemented in its own module for better organization.

mod common;
mod echo;
mod perplexity;

// Re-export tool functions
pub use echo::echo;
pub use perplexity::{run_query, PerplexityTool};
