//! LLM provider settings.
//!
//! Providers are declared in a YAML mapping keyed by provider name. An entry
//! may name another entry in `inherits`; resolving it copies the parent's
//! fields and then applies every field the child sets.
//!
//! ```yaml
//! openai:
//!   api_key_env: OPENAI_API_KEY
//!   api_base: https://api.openai.com/v1
//!   default_model: gpt-4o-mini
//! perplexity:
//!   inherits: openai
//!   api_key_env: PERPLEXITY_API_KEY
//!   api_base: https://api.perplexity.ai
//!   default_model: sonar-pro
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Provider the Perplexity tools are bound to
pub const PERPLEXITY_PROVIDER: &str = "perplexity";

/// Provider document used when no file is configured
pub const BUILTIN_PROVIDERS: &str = r#"
openai:
  api_key_env: OPENAI_API_KEY
  api_base: https://api.openai.com/v1
  default_model: gpt-4o-mini

perplexity:
  inherits: openai
  api_key_env: PERPLEXITY_API_KEY
  api_base: https://api.perplexity.ai
  default_model: sonar-pro
  models:
    - sonar-pro
    - sonar-deep-research
"#;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read provider file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid provider YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),
    #[error("provider '{child}' inherits from unknown provider '{parent}'")]
    UnknownParent { child: String, parent: String },
    #[error("inheritance cycle through provider '{0}'")]
    InheritanceCycle(String),
    #[error("provider '{provider}' is missing required field '{field}'")]
    MissingField {
        provider: String,
        field: &'static str,
    },
    #[error("provider '{provider}' has invalid api_base '{value}': {source}")]
    InvalidBaseUrl {
        provider: String,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// One entry as written in the YAML file; every field is optional until merged.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProviderEntry {
    #[serde(default)]
    pub inherits: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub models: Option<Vec<String>>,
}

impl ProviderEntry {
    /// Fields set on `overrides` replace ours.
    fn merged_with(mut self, overrides: &ProviderEntry) -> Self {
        if overrides.api_key_env.is_some() {
            self.api_key_env = overrides.api_key_env.clone();
        }
        if overrides.api_base.is_some() {
            self.api_base = overrides.api_base.clone();
        }
        if overrides.default_model.is_some() {
            self.default_model = overrides.default_model.clone();
        }
        if overrides.models.is_some() {
            self.models = overrides.models.clone();
        }
        self.inherits = None;
        self
    }
}

/// A provider entry after inheritance, with all required fields present
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub name: String,
    pub api_key_env: String,
    pub api_base: String,
    pub default_model: String,
    pub models: Vec<String>,
}

impl ProviderSettings {
    /// Whether `model` is declared for this provider. An empty list accepts anything.
    pub fn supports_model(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.iter().any(|m| m == model)
    }
}

/// All provider entries from one YAML document
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    entries: BTreeMap<String, ProviderEntry>,
}

impl ProviderConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let entries: BTreeMap<String, ProviderEntry> = serde_yaml::from_str(yaml)?;
        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn builtin() -> Self {
        // The built-in document is a constant; a parse failure here is a bug.
        Self::from_yaml_str(BUILTIN_PROVIDERS).unwrap_or_default()
    }

    /// Load from `explicit` if given, else `user_file` if it exists, else built-ins.
    ///
    /// `user_file` is normally [`default_providers_path`].
    pub fn load(explicit: Option<&Path>, user_file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            debug!("Loading providers from {}", path.display());
            return Self::from_file(path);
        }

        if let Some(path) = user_file.filter(|p| p.exists()) {
            debug!("Loading providers from {}", path.display());
            return Self::from_file(path);
        }

        debug!("Using built-in provider defaults");
        Ok(Self::builtin())
    }

    /// Resolve `name` through its `inherits` chain into complete settings.
    pub fn resolve(&self, name: &str) -> Result<ProviderSettings, ConfigError> {
        let entry = self.merged_entry(name)?;

        let required = |value: Option<String>, field: &'static str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingField {
                    provider: name.to_string(),
                    field,
                })
        };

        let api_key_env = required(entry.api_key_env, "api_key_env")?;
        let api_base = required(entry.api_base, "api_base")?;
        let default_model = required(entry.default_model, "default_model")?;

        url::Url::parse(&api_base).map_err(|source| ConfigError::InvalidBaseUrl {
            provider: name.to_string(),
            value: api_base.clone(),
            source,
        })?;

        Ok(ProviderSettings {
            name: name.to_string(),
            api_key_env,
            api_base,
            default_model,
            models: entry.models.unwrap_or_default(),
        })
    }

    fn merged_entry(&self, name: &str) -> Result<ProviderEntry, ConfigError> {
        let mut chain: Vec<(&str, &ProviderEntry)> = Vec::new();
        let mut seen = HashSet::new();
        let mut current = name;

        loop {
            if !seen.insert(current) {
                return Err(ConfigError::InheritanceCycle(current.to_string()));
            }
            let entry = self.entries.get(current).ok_or_else(|| {
                match chain.last() {
                    Some(&(child, _)) => ConfigError::UnknownParent {
                        child: child.to_string(),
                        parent: current.to_string(),
                    },
                    None => ConfigError::UnknownProvider(current.to_string()),
                }
            })?;
            chain.push((current, entry));

            match entry.inherits.as_deref() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // Apply from the root ancestor down to the requested entry.
        Ok(chain
            .iter()
            .rev()
            .fold(ProviderEntry::default(), |acc, (_, entry)| {
                acc.merged_with(entry)
            }))
    }
}

/// `<config dir>/echo-mcp/providers.yaml`
pub fn default_providers_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("echo-mcp").join("providers.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_perplexity() {
        let settings = ProviderConfig::builtin()
            .resolve(PERPLEXITY_PROVIDER)
            .unwrap();
        assert_eq!(settings.api_key_env, "PERPLEXITY_API_KEY");
        assert_eq!(settings.api_base, "https://api.perplexity.ai");
        assert_eq!(settings.default_model, "sonar-pro");
        assert!(settings.supports_model("sonar-deep-research"));
        assert!(!settings.supports_model("gpt-4o"));
    }

    #[test]
    fn test_inherits_copies_base_then_overrides() {
        let config = ProviderConfig::from_yaml_str(
            r#"
base:
  api_key_env: BASE_KEY
  api_base: https://base.example.com/v1
  default_model: base-model
child:
  inherits: base
  default_model: child-model
"#,
        )
        .unwrap();

        let child = config.resolve("child").unwrap();
        assert_eq!(child.api_key_env, "BASE_KEY");
        assert_eq!(child.api_base, "https://base.example.com/v1");
        assert_eq!(child.default_model, "child-model");

        // The base entry itself is untouched.
        assert_eq!(config.resolve("base").unwrap().default_model, "base-model");
    }

    #[test]
    fn test_multi_level_inheritance() {
        let config = ProviderConfig::from_yaml_str(
            r#"
a:
  api_key_env: A_KEY
  api_base: https://a.example.com
  default_model: a
b:
  inherits: a
  api_base: https://b.example.com
c:
  inherits: b
  models: [c1, c2]
"#,
        )
        .unwrap();

        let c = config.resolve("c").unwrap();
        assert_eq!(c.api_key_env, "A_KEY");
        assert_eq!(c.api_base, "https://b.example.com");
        assert_eq!(c.default_model, "a");
        assert_eq!(c.models, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn test_inheritance_cycle_rejected() {
        let config = ProviderConfig::from_yaml_str(
            r#"
x:
  inherits: y
y:
  inherits: x
"#,
        )
        .unwrap();

        assert!(matches!(
            config.resolve("x"),
            Err(ConfigError::InheritanceCycle(_))
        ));
    }

    #[test]
    fn test_unknown_parent_and_provider() {
        let config = ProviderConfig::from_yaml_str("child:\n  inherits: ghost\n").unwrap();

        match config.resolve("child") {
            Err(ConfigError::UnknownParent { child, parent }) => {
                assert_eq!(child, "child");
                assert_eq!(parent, "ghost");
            }
            other => panic!("Expected UnknownParent, got {:?}", other),
        }
        assert!(matches!(
            config.resolve("nope"),
            Err(ConfigError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_missing_field_named() {
        let config =
            ProviderConfig::from_yaml_str("p:\n  api_key_env: K\n  api_base: https://x.io\n")
                .unwrap();
        let err = config.resolve("p").unwrap_err();
        assert!(err.to_string().contains("default_model"));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ProviderConfig::from_yaml_str(
            "p:\n  api_key_env: K\n  api_base: not a url\n  default_model: m\n",
        )
        .unwrap();
        assert!(matches!(
            config.resolve("p"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = ProviderConfig::from_yaml_str(
            r#"
p:
  client: some.python.Client
  api_key_env: K
  api_base: https://x.io
  default_model: m
"#,
        )
        .unwrap();
        assert!(config.resolve("p").is_ok());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "perplexity:\n  api_key_env: MY_KEY\n  api_base: http://127.0.0.1:9\n  default_model: sonar-pro"
        )
        .unwrap();

        let config = ProviderConfig::load(Some(file.path()), None).unwrap();
        let settings = config.resolve(PERPLEXITY_PROVIDER).unwrap();
        assert_eq!(settings.api_key_env, "MY_KEY");
    }

    #[test]
    fn test_load_prefers_user_file_over_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let user_file = dir.path().join("providers.yaml");
        std::fs::write(
            &user_file,
            "perplexity:\n  api_key_env: USER_KEY\n  api_base: https://user.example.com\n  default_model: sonar-pro\n",
        )
        .unwrap();

        let config = ProviderConfig::load(None, Some(&user_file)).unwrap();
        assert_eq!(
            config.resolve(PERPLEXITY_PROVIDER).unwrap().api_key_env,
            "USER_KEY"
        );

        // An absent user file falls back to the built-in table.
        let missing = dir.path().join("absent.yaml");
        let config = ProviderConfig::load(None, Some(&missing)).unwrap();
        assert_eq!(
            config.resolve(PERPLEXITY_PROVIDER).unwrap().api_key_env,
            "PERPLEXITY_API_KEY"
        );
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = ProviderConfig::load(Some(Path::new("/nonexistent/providers.yaml")), None);
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            ProviderConfig::from_yaml_str("p: [unclosed"),
            Err(ConfigError::Parse(_))
        ));
    }
}
