//! Perplexity tool implementations.
//!
//! All three tools send the query as a single user message and wrap the
//! completion as `{ "answer": ... }`. They differ in model, time limit and
//! prompt shape.

use std::time::{Duration, Instant};

use rmcp::model::CallToolResult;
use tracing::{debug, error, info};

use crate::config::ToolTimeouts;
use crate::llm::{ChatMessage, SharedCompletionClient};
use crate::mcp::types::{PerplexityAnswer, PerplexityQuery};
use crate::startup::LlmUnavailable;

use super::common::{structured_result, tool_error};

const SEARCH_MODEL: &str = "sonar-pro";
const DEEP_RESEARCH_MODEL: &str = "sonar-deep-research";
const QUICK_FACT_PREFIX: &str = "Quick fact: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerplexityTool {
    Search,
    DeepResearch,
    QuickFact,
}

impl PerplexityTool {
    pub const ALL: [PerplexityTool; 3] = [
        PerplexityTool::Search,
        PerplexityTool::DeepResearch,
        PerplexityTool::QuickFact,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PerplexityTool::Search => "perplexity_search",
            PerplexityTool::DeepResearch => "perplexity_deep_research",
            PerplexityTool::QuickFact => "perplexity_quick_fact",
        }
    }

    pub fn model(self) -> &'static str {
        match self {
            PerplexityTool::Search | PerplexityTool::QuickFact => SEARCH_MODEL,
            PerplexityTool::DeepResearch => DEEP_RESEARCH_MODEL,
        }
    }

    pub fn timeout(self, timeouts: &ToolTimeouts) -> Duration {
        match self {
            PerplexityTool::Search => timeouts.search,
            PerplexityTool::DeepResearch => timeouts.deep_research,
            PerplexityTool::QuickFact => timeouts.quick_fact,
        }
    }

    fn prompt(self, query: &str) -> String {
        match self {
            PerplexityTool::QuickFact => format!("{}{}", QUICK_FACT_PREFIX, query),
            _ => query.to_string(),
        }
    }
}

/// Run one Perplexity tool call.
///
/// Failures come back as tool errors so the caller sees a readable message.
pub async fn run_query(
    tool: PerplexityTool,
    client: Result<&SharedCompletionClient, &LlmUnavailable>,
    args: PerplexityQuery,
    timeout: Duration,
) -> CallToolResult {
    let client = match client {
        Ok(client) => client,
        Err(reason) => {
            return tool_error(format!("Error: {} is unavailable: {}", tool.name(), reason));
        }
    };

    let start = Instant::now();
    info!("🔍 {} ({}s limit)", tool.name(), timeout.as_secs());
    debug!("   Query: {}", args.query);

    let messages = vec![ChatMessage::user(tool.prompt(&args.query))];
    let result = tokio::time::timeout(timeout, client.complete(tool.model(), messages)).await;
    let elapsed = start.elapsed();

    match result {
        Ok(Ok(completion)) => {
            info!("✅ {} completed in {:.2?}", tool.name(), elapsed);
            structured_result(&PerplexityAnswer {
                answer: completion.response,
            })
        }
        Ok(Err(e)) => {
            error!("{} failed after {:.2?}: {}", tool.name(), elapsed, e);
            tool_error(format!("Error calling {}: {}", tool.name(), e))
        }
        Err(_) => {
            error!("{} timed out after {}s", tool.name(), timeout.as_secs());
            tool_error(format!(
                "Error: {} timed out after {} seconds",
                tool.name(),
                timeout.as_secs()
            ))
        }
    }
}
