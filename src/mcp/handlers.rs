//! MCP server handlers.
//!
//! This module contains the startup sequence and the server loop:
//! `NotStarted → Bootstrapping (optional) → Running → Stopped`.

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::startup;

use super::server::EchoMcpServer;
use super::tools::PerplexityTool;

/// Phases of the server process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    NotStarted,
    Bootstrapping,
    Running,
    Stopped,
}

/// Tracks and logs phase transitions
#[derive(Debug)]
pub struct Lifecycle {
    phase: ServerPhase,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            phase: ServerPhase::NotStarted,
        }
    }
}

impl Lifecycle {
    pub fn phase(&self) -> ServerPhase {
        self.phase
    }

    pub fn enter(&mut self, next: ServerPhase) {
        info!("Server phase: {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }
}

/// Bootstrap (unless skipped) and build the server.
pub async fn prepare_server(
    config: &ServerConfig,
    lifecycle: &mut Lifecycle,
) -> Result<EchoMcpServer> {
    if !config.skip_bootstrap {
        lifecycle.enter(ServerPhase::Bootstrapping);
    }

    let state = startup::bootstrap(config)
        .await
        .context("Startup failed")?;

    if let Some(provider) = &state.provider {
        info!("LLM provider: {} ({})", provider.name, provider.api_base);
        for tool in PerplexityTool::ALL {
            if !provider.supports_model(tool.model()) {
                warn!(
                    "Provider '{}' does not list model '{}' used by {}",
                    provider.name,
                    tool.model(),
                    tool.name()
                );
            }
        }
    }
    if let Err(reason) = &state.llm {
        if state.bootstrapped() {
            warn!("Bootstrap finished without a completion client: {}", reason);
        }
    }

    Ok(EchoMcpServer::new(state, config.timeouts))
}

/// Run the MCP server over stdio until the client disconnects or Ctrl-C.
pub async fn run_mcp_server(config: ServerConfig) -> Result<()> {
    info!("🔧 Starting Echo MCP Tool Server...");
    info!("📝 Stdio mode (using rmcp)");

    let mut lifecycle = Lifecycle::default();
    let server = prepare_server(&config, &mut lifecycle).await?;

    if !server.has_llm() {
        info!("Perplexity tools are registered but not configured");
    }

    serve_io(server, tokio::io::stdin(), tokio::io::stdout(), &mut lifecycle).await
}

/// Serve `server` over any byte stream pair.
pub async fn serve_io<R, W>(
    server: EchoMcpServer,
    reader: R,
    writer: W,
    lifecycle: &mut Lifecycle,
) -> Result<()>
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    use rmcp::ServiceExt;

    // Start the service
    let service = match server.serve((reader, writer)).await {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to start MCP service: {:?}", e);
            lifecycle.enter(ServerPhase::Stopped);
            return Err(anyhow::anyhow!("Failed to start MCP service: {:?}", e));
        }
    };

    lifecycle.enter(ServerPhase::Running);
    info!("✅ MCP tool server started");
    info!("🔗 Ready for MCP client connections");

    // Wait for the client to disconnect or for an interrupt
    tokio::select! {
        result = service.waiting() => {
            if let Err(e) = result {
                error!("MCP service error: {:?}", e);
                lifecycle.enter(ServerPhase::Stopped);
                return Err(anyhow::anyhow!("MCP service error: {:?}", e));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt");
        }
    }

    lifecycle.enter(ServerPhase::Stopped);
    info!("MCP server shutting down ({:?})", lifecycle.phase());
    Ok(())
}
