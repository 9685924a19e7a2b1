//! Process configuration resolved once at startup.
//!
//! Everything that reads the environment lives here so the rest of the
//! server receives plain values. `main` builds a [`ServerConfig`] from the
//! CLI and environment, then hands it to the startup routine.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

/// Environment variable that skips bootstrap when set to a truthy value
pub const NO_BOOTSTRAP_ENV: &str = "NO_BOOTSTRAP";

pub const SEARCH_TIMEOUT_ENV: &str = "PERPLEXITY_SEARCH_TIMEOUT";
pub const DEEP_RESEARCH_TIMEOUT_ENV: &str = "PERPLEXITY_DEEP_RESEARCH_TIMEOUT";
pub const QUICK_FACT_TIMEOUT_ENV: &str = "PERPLEXITY_QUICK_FACT_TIMEOUT";

const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DEEP_RESEARCH_TIMEOUT_SECS: u64 = 90;
const DEFAULT_QUICK_FACT_TIMEOUT_SECS: u64 = 15;

/// Interpret an environment value as a set flag.
///
/// Any non-empty value counts, except an explicit "0", "false", "no" or
/// "off" (any case).
pub fn is_flag_set(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    !value.is_empty() && !matches!(value.as_str(), "0" | "false" | "no" | "off")
}

/// Per-tool time limits for the Perplexity tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolTimeouts {
    pub search: Duration,
    pub deep_research: Duration,
    pub quick_fact: Duration,
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        Self {
            search: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
            deep_research: Duration::from_secs(DEFAULT_DEEP_RESEARCH_TIMEOUT_SECS),
            quick_fact: Duration::from_secs(DEFAULT_QUICK_FACT_TIMEOUT_SECS),
        }
    }
}

impl ToolTimeouts {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            search: timeout_override(SEARCH_TIMEOUT_ENV, lookup(SEARCH_TIMEOUT_ENV))
                .unwrap_or(defaults.search),
            deep_research: timeout_override(
                DEEP_RESEARCH_TIMEOUT_ENV,
                lookup(DEEP_RESEARCH_TIMEOUT_ENV),
            )
            .unwrap_or(defaults.deep_research),
            quick_fact: timeout_override(QUICK_FACT_TIMEOUT_ENV, lookup(QUICK_FACT_TIMEOUT_ENV))
                .unwrap_or(defaults.quick_fact),
        }
    }
}

fn timeout_override(key: &str, value: Option<String>) -> Option<Duration> {
    let raw = value?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => {
            debug!("{} overridden to {}s", key, secs);
            Some(Duration::from_secs(secs))
        }
        _ => {
            warn!("Ignoring invalid {}={:?}, using default", key, raw);
            None
        }
    }
}

/// Configuration passed into the startup routine
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Skip optional component initialization
    pub skip_bootstrap: bool,
    /// Explicit provider file; falls back to the user config dir, then built-in defaults
    pub providers_path: Option<PathBuf>,
    pub timeouts: ToolTimeouts,
}

impl ServerConfig {
    /// Combine CLI flags with the environment.
    ///
    /// A `--no-bootstrap` flag and a set `NO_BOOTSTRAP` both skip bootstrap.
    pub fn resolve(no_bootstrap_flag: bool, providers_path: Option<PathBuf>) -> Self {
        Self::resolve_with(no_bootstrap_flag, providers_path, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        no_bootstrap_flag: bool,
        providers_path: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let env_skip = lookup(NO_BOOTSTRAP_ENV).is_some_and(|v| is_flag_set(&v));
        Self {
            skip_bootstrap: no_bootstrap_flag || env_skip,
            providers_path,
            timeouts: ToolTimeouts::from_lookup(lookup),
        }
    }
}
