//! Startup ensure steps for the optional bootstrap.
//!
//! ```text
//! providers.ensure()    // load provider file, resolve the perplexity entry
//! credentials.ensure()  // read the API key named by api_key_env
//! client.ensure()       // build the completion client
//! ```
//!
//! Every step records an [`EnsureStatus`] so a failed startup can say how far it got.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::llm::{LlmError, OpenAiCompatClient, SharedCompletionClient};
use crate::providers::{
    default_providers_path, ConfigError, ProviderConfig, ProviderSettings, PERPLEXITY_PROVIDER,
};

/// Expected prefix of Perplexity API keys
const PERPLEXITY_KEY_PREFIX: &str = "pplx-";

#[derive(Debug, Error)]
pub enum EnsureError {
    #[error("Provider configuration error: {0}")]
    Providers(#[from] ConfigError),
    #[error("API key not found: environment variable {var} is not set")]
    MissingApiKey { var: String },
    #[error("Failed to build completion client: {0}")]
    Client(#[from] LlmError),
}

impl EnsureError {
    /// Why the LLM tools are off when startup may continue without them.
    ///
    /// `None` means startup must abort.
    pub fn degraded_reason(&self) -> Option<LlmUnavailable> {
        match self {
            EnsureError::MissingApiKey { var } => {
                Some(LlmUnavailable::MissingApiKey { var: var.clone() })
            }
            _ => None,
        }
    }
}

/// Why the server has no completion client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmUnavailable {
    BootstrapSkipped,
    MissingApiKey { var: String },
}

impl fmt::Display for LlmUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmUnavailable::BootstrapSkipped => write!(
                f,
                "bootstrap was skipped (NO_BOOTSTRAP or --no-bootstrap); restart without it"
            ),
            LlmUnavailable::MissingApiKey { var } => {
                write!(f, "{} is not set; set it and restart the server", var)
            }
        }
    }
}

pub type EnsureResult<T> = std::result::Result<T, EnsureError>;

/// State of each ensure component
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnsureStatus {
    #[default]
    NotStarted,
    InProgress,
    Success,
    Failed(String),
}

impl EnsureStatus {
    #[allow(dead_code)]
    pub fn is_success(&self) -> bool {
        matches!(self, EnsureStatus::Success)
    }
}

/// Components produced by startup
#[derive(Clone)]
pub struct StartupState {
    /// The completion client, or why there is none
    pub llm: Result<SharedCompletionClient, LlmUnavailable>,
    pub provider: Option<ProviderSettings>,
    bootstrapped: bool,
}

impl StartupState {
    /// State for a server started with bootstrap skipped
    pub fn skipped() -> Self {
        Self {
            llm: Err(LlmUnavailable::BootstrapSkipped),
            provider: None,
            bootstrapped: false,
        }
    }

    /// Bootstrap ran but left the LLM tools without a client
    pub fn degraded(provider: Option<ProviderSettings>, reason: LlmUnavailable) -> Self {
        Self {
            llm: Err(reason),
            provider,
            bootstrapped: true,
        }
    }

    pub fn ready(provider: ProviderSettings, llm: SharedCompletionClient) -> Self {
        Self {
            llm: Ok(llm),
            provider: Some(provider),
            bootstrapped: true,
        }
    }

    pub fn bootstrapped(&self) -> bool {
        self.bootstrapped
    }
}

impl std::fmt::Debug for StartupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupState")
            .field("llm", &self.llm.as_ref().map(|_| "ready"))
            .field("provider", &self.provider)
            .field("bootstrapped", &self.bootstrapped)
            .finish()
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Startup context that runs the ensure steps in order.
///
/// # Example
/// ```ignore
/// let mut ctx = StartupContext::new(config);
/// let state = ctx.ensure_all().await?;
/// ```
pub struct StartupContext {
    config: ServerConfig,
    user_providers: Option<PathBuf>,
    env: EnvLookup,
    providers_status: EnsureStatus,
    credentials_status: EnsureStatus,
    client_status: EnsureStatus,
    resolved_provider: Option<ProviderSettings>,
}

impl StartupContext {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_sources(config, default_providers_path(), |key| {
            std::env::var(key).ok()
        })
    }

    /// Use `user_providers` instead of the user config dir file, and `lookup`
    /// instead of the process environment for credentials
    pub fn with_sources(
        config: ServerConfig,
        user_providers: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            user_providers,
            env: Box::new(lookup),
            providers_status: EnsureStatus::NotStarted,
            credentials_status: EnsureStatus::NotStarted,
            client_status: EnsureStatus::NotStarted,
            resolved_provider: None,
        }
    }

    async fn ensure_providers(&mut self) -> EnsureResult<ProviderSettings> {
        info!("📚 Loading LLM provider configuration...");
        self.providers_status = EnsureStatus::InProgress;

        let result = ProviderConfig::load(
            self.config.providers_path.as_deref(),
            self.user_providers.as_deref(),
        )
            .and_then(|config| config.resolve(PERPLEXITY_PROVIDER));

        match result {
            Ok(settings) => {
                info!("✅ Provider '{}' resolved", settings.name);
                debug!("   Base URL: {}", settings.api_base);
                debug!("   Default model: {}", settings.default_model);
                self.providers_status = EnsureStatus::Success;
                self.resolved_provider = Some(settings.clone());
                Ok(settings)
            }
            Err(e) => {
                error!("❌ {}", e);
                self.providers_status = EnsureStatus::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    async fn ensure_credentials(&mut self, settings: &ProviderSettings) -> EnsureResult<String> {
        info!("🔐 Checking API credentials...");
        self.credentials_status = EnsureStatus::InProgress;

        let key = (self.env)(&settings.api_key_env)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let Some(key) = key else {
            warn!("⚠️  {} is not set", settings.api_key_env);
            self.credentials_status =
                EnsureStatus::Failed(format!("{} is not set", settings.api_key_env));
            return Err(EnsureError::MissingApiKey {
                var: settings.api_key_env.clone(),
            });
        };

        if settings.name == PERPLEXITY_PROVIDER && !key.starts_with(PERPLEXITY_KEY_PREFIX) {
            warn!(
                "⚠️  {} does not start with '{}'; requests may be rejected",
                settings.api_key_env, PERPLEXITY_KEY_PREFIX
            );
        }

        info!("✅ API credentials found");
        self.credentials_status = EnsureStatus::Success;
        Ok(key)
    }

    async fn ensure_client(
        &mut self,
        settings: &ProviderSettings,
        api_key: String,
    ) -> EnsureResult<SharedCompletionClient> {
        self.client_status = EnsureStatus::InProgress;

        match OpenAiCompatClient::from_settings(settings, api_key) {
            Ok(client) => {
                info!("✅ Completion client ready ({})", client.endpoint());
                self.client_status = EnsureStatus::Success;
                Ok(Arc::new(client))
            }
            Err(e) => {
                error!("❌ {}", e);
                self.client_status = EnsureStatus::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Run every ensure step, stopping at the first failure.
    pub async fn ensure_all(&mut self) -> EnsureResult<StartupState> {
        let settings = self.ensure_providers().await?;
        let api_key = self.ensure_credentials(&settings).await?;
        let client = self.ensure_client(&settings, api_key).await?;

        Ok(StartupState::ready(settings, client))
    }

    /// Provider settings resolved so far, if the providers step succeeded
    pub fn resolved_provider(&self) -> Option<&ProviderSettings> {
        self.resolved_provider.as_ref()
    }

    #[allow(dead_code)]
    pub fn providers_status(&self) -> &EnsureStatus {
        &self.providers_status
    }

    #[allow(dead_code)]
    pub fn credentials_status(&self) -> &EnsureStatus {
        &self.credentials_status
    }

    #[allow(dead_code)]
    pub fn client_status(&self) -> &EnsureStatus {
        &self.client_status
    }
}
