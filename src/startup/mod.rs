//! Startup initialization.
//!
//! Bootstrap prepares the components the LLM tools need. It can be skipped
//! with `NO_BOOTSTRAP`, in which case the server still starts and only the
//! echo tool is fully functional.

mod ensure;

pub use ensure::{EnsureError, EnsureResult, LlmUnavailable, StartupContext, StartupState};

use tracing::{info, warn};

use crate::config::ServerConfig;

/// Run bootstrap unless the config says to skip it.
///
/// Fatal ensure failures are returned; a missing API key yields a degraded state.
pub async fn bootstrap(config: &ServerConfig) -> EnsureResult<StartupState> {
    if config.skip_bootstrap {
        info!("⏭️  Bootstrap skipped (NO_BOOTSTRAP)");
        return Ok(StartupState::skipped());
    }

    let mut ctx = StartupContext::new(config.clone());
    match ctx.ensure_all().await {
        Ok(state) => Ok(state),
        Err(e) => match e.degraded_reason() {
            Some(reason) => {
                warn!("{}; Perplexity tools will be unavailable", e);
                Ok(StartupState::degraded(
                    ctx.resolved_provider().cloned(),
                    reason,
                ))
            }
            None => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_skip_bootstrap_omits_initialization() {
        // A provider path that cannot be read would fail bootstrap if it ran.
        let config = ServerConfig {
            skip_bootstrap: true,
            providers_path: Some(PathBuf::from("/nonexistent/providers.yaml")),
            ..Default::default()
        };

        let state = bootstrap(&config).await.unwrap();
        assert!(!state.bootstrapped());
        assert!(matches!(state.llm, Err(LlmUnavailable::BootstrapSkipped)));
        assert!(state.provider.is_none());
    }

    #[tokio::test]
    async fn test_unreadable_provider_file_is_fatal() {
        let config = ServerConfig {
            skip_bootstrap: false,
            providers_path: Some(PathBuf::from("/nonexistent/providers.yaml")),
            ..Default::default()
        };

        let err = bootstrap(&config).await.unwrap_err();
        assert!(matches!(err, EnsureError::Providers(_)));
    }
}
