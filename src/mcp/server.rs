//! MCP server implementation.
//!
//! This module contains the EchoMcpServer struct and its tool routing.

use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::{Json, Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};

use crate::config::ToolTimeouts;
use crate::llm::SharedCompletionClient;
use crate::startup::{LlmUnavailable, StartupState};

use super::tools::{self, PerplexityTool};
use super::types::*;

/// Echo MCP Server
#[derive(Clone)]
pub struct EchoMcpServer {
    llm: Result<SharedCompletionClient, LlmUnavailable>,
    timeouts: ToolTimeouts,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl EchoMcpServer {
    /// Create a server from the startup state.
    ///
    /// Without a completion client the Perplexity tools stay registered but
    /// answer with a tool error naming the reason.
    pub fn new(state: StartupState, timeouts: ToolTimeouts) -> Self {
        Self {
            llm: state.llm,
            timeouts,
            tool_router: Self::tool_router(),
        }
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_ok()
    }

    /// Echo back the input message
    #[tool(description = "Echo back the input message unchanged")]
    fn echo(
        &self,
        Parameters(request): Parameters<EchoRequest>,
    ) -> Result<Json<EchoResult>, McpError> {
        Ok(Json(tools::echo(request)))
    }

    #[tool(
        name = "perplexity_search",
        description = "Quick conversational answer using Perplexity sonar-pro"
    )]
    async fn perplexity_search(
        &self,
        Parameters(args): Parameters<PerplexityQuery>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.run_perplexity(PerplexityTool::Search, args).await)
    }

    #[tool(
        name = "perplexity_deep_research",
        description = "Comprehensive, citation-rich answer using Perplexity sonar-deep-research"
    )]
    async fn perplexity_deep_research(
        &self,
        Parameters(args): Parameters<PerplexityQuery>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.run_perplexity(PerplexityTool::DeepResearch, args).await)
    }

    #[tool(
        name = "perplexity_quick_fact",
        description = "Ultra-fast fact checking using Perplexity sonar-pro"
    )]
    async fn perplexity_quick_fact(
        &self,
        Parameters(args): Parameters<PerplexityQuery>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.run_perplexity(PerplexityTool::QuickFact, args).await)
    }

    async fn run_perplexity(&self, tool: PerplexityTool, args: PerplexityQuery) -> CallToolResult {
        tools::run_query(tool, self.llm.as_ref(), args, tool.timeout(&self.timeouts)).await
    }
}

#[tool_handler]
impl ServerHandler for EchoMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "echo-mcp".to_string(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Echo MCP Server provides an echo tool and Perplexity search tools.".to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mcp_server_creation() {
        let server = EchoMcpServer::new(StartupState::skipped(), ToolTimeouts::default());
        assert!(!server.has_llm());
        assert_eq!(server.timeouts, ToolTimeouts::default());
    }

    #[tokio::test]
    async fn test_unavailable_tool_names_missing_key() {
        let state = StartupState::degraded(
            None,
            LlmUnavailable::MissingApiKey {
                var: "CUSTOM_KEY".to_string(),
            },
        );
        let server = EchoMcpServer::new(state, ToolTimeouts::default());

        let result = server
            .run_perplexity(
                PerplexityTool::Search,
                PerplexityQuery {
                    query: "q".to_string(),
                },
            )
            .await;

        assert_eq!(result.is_error, Some(true));
        let text = serde_json::to_string(&result.content).unwrap();
        assert!(text.contains("CUSTOM_KEY is not set"), "got {text}");
        assert!(!text.contains("PERPLEXITY_API_KEY"));
    }

    #[test]
    fn test_registered_tools() {
        let server = EchoMcpServer::new(StartupState::skipped(), ToolTimeouts::default());
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "echo",
                "perplexity_deep_research",
                "perplexity_quick_fact",
                "perplexity_search",
            ]
        );
    }

    #[test]
    fn test_echo_advertises_output_schema() {
        let server = EchoMcpServer::new(StartupState::skipped(), ToolTimeouts::default());
        let echo = server
            .tool_router
            .list_all()
            .into_iter()
            .find(|t| t.name == "echo")
            .unwrap();

        let output = echo.output_schema.expect("echo should declare an output schema");
        assert!(output.contains_key("properties"));
        assert!(echo.input_schema.contains_key("properties"));
    }
}
