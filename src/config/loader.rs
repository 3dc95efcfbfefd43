//! Configuration resolution: fetch text, parse, apply defaults.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::env::EnvDefaults;
use crate::config::schema::Config;
use crate::discovery::{DiscoveryError, KvClient};

/// Service names ending with this marker are read from a local file.
pub const LOCAL_SUFFIX: &str = "local";

/// Error type for configuration resolution.
#[derive(Debug)]
pub enum ConfigError {
    /// No config entry exists for the service.
    NotFound(String),
    /// The KV store could not be queried.
    Transport {
        service: String,
        source: DiscoveryError,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Malformed configuration text. Fatal at startup.
    Parse(String),
}

impl ConfigError {
    /// Parse failures are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConfigError::Parse(_))
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFound(name) => write!(f, "no configuration found for '{}'", name),
            ConfigError::Transport { service, source } => {
                write!(f, "failed to fetch k/v pairs for '{}': {}", service, source)
            }
            ConfigError::Io { path, source } => {
                write!(f, "IO error reading {}: {}", path.display(), source)
            }
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Transport { source, .. } => Some(source),
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Text formats configuration can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Local file extensions, in lookup order.
    const LOCAL_CANDIDATES: [(&'static str, ConfigFormat); 3] = [
        ("yaml", ConfigFormat::Yaml),
        ("yml", ConfigFormat::Yaml),
        ("toml", ConfigFormat::Toml),
    ];
}

/// Parse YAML config text and apply process-environment defaults.
pub fn parse_config(text: &str) -> Result<Config, ConfigError> {
    parse_config_with(text, ConfigFormat::Yaml, &EnvDefaults::process())
}

/// Parse config text in `format` and apply defaults from `env`.
///
/// Remote and local text both go through here, so defaulting is identical
/// regardless of where the text came from.
pub fn parse_config_with(
    text: &str,
    format: ConfigFormat,
    env: &EnvDefaults,
) -> Result<Config, ConfigError> {
    let parsed: Config = match format {
        // An empty document is a config with every field unset.
        ConfigFormat::Yaml if text.trim().is_empty() => Config::default(),
        ConfigFormat::Yaml => {
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?
        }
        ConfigFormat::Toml => toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?,
    };

    Ok(parsed.with_defaults(env))
}

/// Builds the configuration snapshot for a named service.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    kv: KvClient,
    env: EnvDefaults,
    local_dir: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(kv: KvClient, env: EnvDefaults) -> Self {
        Self {
            kv,
            env,
            local_dir: None,
        }
    }

    /// Look for local config files in `dir` instead of the working directory.
    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = Some(dir.into());
        self
    }

    /// Resolve the configuration for `service_name`.
    ///
    /// Names ending in `local` read `<name>.yaml` (or `.yml` / `.toml`) from the
    /// local directory; every other name is looked up in the KV store.
    pub async fn read_config(&self, service_name: &str) -> Result<Config, ConfigError> {
        let config = if service_name.ends_with(LOCAL_SUFFIX) {
            self.read_local(service_name)?
        } else {
            self.read_remote(service_name).await?
        };

        tracing::debug!(service = %service_name, config = ?config, "Configuration resolved");
        Ok(config)
    }

    async fn read_remote(&self, service_name: &str) -> Result<Config, ConfigError> {
        let entries = self
            .kv
            .list(service_name)
            .await
            .map_err(|source| ConfigError::Transport {
                service: service_name.to_string(),
                source,
            })?;

        // Only the exact key is decoded; siblings sharing the prefix are ignored.
        let text = entries
            .iter()
            .filter(|entry| entry.key() == service_name)
            .find_map(|entry| entry.value().transpose())
            .transpose()
            .map_err(|e| ConfigError::Parse(e.to_string()))?
            .ok_or_else(|| ConfigError::NotFound(service_name.to_string()))?;

        let text = String::from_utf8(text)
            .map_err(|e| ConfigError::Parse(format!("config for '{}' is not UTF-8: {}", service_name, e)))?;

        parse_config_with(&text, ConfigFormat::Yaml, &self.env)
    }

    fn read_local(&self, service_name: &str) -> Result<Config, ConfigError> {
        let dir = match &self.local_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|source| ConfigError::Io {
                path: PathBuf::from("."),
                source,
            })?,
        };

        let (path, format) = local_candidate(&dir, service_name);
        tracing::debug!(path = %path.display(), "Reading local configuration");

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        parse_config_with(&text, format, &self.env)
    }
}

/// First existing `<name>.<ext>` in `dir`, defaulting to the YAML path.
fn local_candidate(dir: &Path, service_name: &str) -> (PathBuf, ConfigFormat) {
    ConfigFormat::LOCAL_CANDIDATES
        .iter()
        .map(|(ext, format)| (dir.join(format!("{}.{}", service_name, ext)), *format))
        .find(|(path, _)| path.is_file())
        .unwrap_or_else(|| (dir.join(format!("{}.yaml", service_name)), ConfigFormat::Yaml))
}
