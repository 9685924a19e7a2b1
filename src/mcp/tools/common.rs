//! Common utilities for MCP tools.

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

/// Error result for tool failures
pub fn tool_error(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

/// Success result carrying `value` as structured content
pub fn structured_result<T: Serialize>(value: &T) -> CallToolResult {
    match serde_json::to_value(value) {
        Ok(json) => CallToolResult::structured(json),
        Err(e) => tool_error(format!("Error: failed to serialize result: {}", e)),
    }
}
