//! MCP tool parameter and result types.
//!
//! Parameters are used with rmcp's `Parameters<T>` wrapper, which
//! deserializes and validates arguments before a tool body runs. Results
//! derive `JsonSchema` so their output schema is advertised too.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the echo tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EchoRequest {
    /// The message to echo
    pub message: String,
}

/// Result of the echo tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EchoResult {
    /// The message exactly as received
    pub message: String,
}

/// Parameters shared by the Perplexity tools
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PerplexityQuery {
    /// The question to answer
    pub query: String,
}

/// Result of the Perplexity tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PerplexityAnswer {
    /// Answer text returned by the model
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_echo_request_requires_message() {
        assert!(serde_json::from_value::<EchoRequest>(json!({})).is_err());
    }

    #[test]
    fn test_echo_request_rejects_non_string() {
        assert!(serde_json::from_value::<EchoRequest>(json!({ "message": 42 })).is_err());
        assert!(serde_json::from_value::<EchoRequest>(json!({ "message": null })).is_err());
        assert!(serde_json::from_value::<EchoRequest>(json!({ "message": ["a"] })).is_err());
    }

    #[test]
    fn test_echo_schema_marks_message_required() {
        let schema = serde_json::to_value(schemars::schema_for!(EchoRequest)).unwrap();
        assert_eq!(schema["properties"]["message"]["type"], "string");
        assert_eq!(schema["required"], json!(["message"]));
    }
}
