//! Echo tool implementation.

use crate::mcp::types::{EchoRequest, EchoResult};

/// Echo back the input message
pub fn echo(request: EchoRequest) -> EchoResult {
    EchoResult {
        message: request.message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_str(message: &str) -> String {
        echo(EchoRequest {
            message: message.to_string(),
        })
        .message
    }

    #[test]
    fn test_echo_returns_message() {
        assert_eq!(echo_str("Hello, world!"), "Hello, world!");
    }

    #[test]
    fn test_echo_empty() {
        assert_eq!(echo_str(""), "");
    }

    #[test]
    fn test_echo_unicode() {
        assert_eq!(echo_str("✓ ünïcödé"), "✓ ünïcödé");
        assert_eq!(echo_str("line1\nline2\t🦀"), "line1\nline2\t🦀");
    }

    #[test]
    fn test_echo_idempotent() {
        let request = EchoRequest {
            message: "same".to_string(),
        };
        assert_eq!(echo(request.clone()), echo(request));
    }
}
