use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod llm;
mod mcp;
mod providers;
mod startup;

use config::ServerConfig;

/// Echo MCP server - echo tool plus Perplexity search over stdio
#[derive(Parser)]
#[command(name = "echo-mcp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Skip optional component initialization (same as NO_BOOTSTRAP=1)
    #[arg(long)]
    no_bootstrap: bool,

    /// LLM provider YAML file (defaults to the user config dir, then built-in settings)
    #[arg(long, env = "LLM_PROVIDERS_CONFIG")]
    providers: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries the protocol, so log to stderr
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::resolve(cli.no_bootstrap, cli.providers);

    mcp::run_mcp_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["echo-mcp"]).unwrap();
        assert!(!cli.verbose);
        assert!(!cli.no_bootstrap);
    }

    #[test]
    fn test_cli_flags() {
        let cli =
            Cli::try_parse_from(["echo-mcp", "-v", "--no-bootstrap", "--providers", "p.yaml"])
                .unwrap();
        assert!(cli.verbose);
        assert!(cli.no_bootstrap);
        assert_eq!(cli.providers, Some(PathBuf::from("p.yaml")));
    }
}
