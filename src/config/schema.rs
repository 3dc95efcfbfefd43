//! Configuration schema definitions.
//!
//! This module defines the complete configuration snapshot for a service.
//! All types derive Serde traits for deserialization from config text; keys
//! are kebab-case and the legacy key names are accepted as aliases.
//!
//! # Defaulting
//! Every field left empty by parsing is filled from an environment variable,
//! then from a literal. The tenant prefix (`DB_PREFIX`) is prepended to both
//! database names and to the queue virtual host.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::env::EnvDefaults;

/// Service name used when neither the config text nor `SERVER_NAME` sets one.
pub const DEFAULT_SERVICE_NAME: &str = "us-diagram";

/// Environment variable holding the tenant prefix.
pub const TENANT_PREFIX_VAR: &str = "DB_PREFIX";

const DEFAULT_DATABASE: &str = "us_diagram";

/// Root configuration snapshot for a service instance.
///
/// Built once by the resolver and shared read-only afterwards.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Address the instance advertises to the registry.
    #[serde(deserialize_with = "scalar_string")]
    pub host: String,

    /// Listening port, kept as text the way it appears in config.
    #[serde(deserialize_with = "scalar_string")]
    pub port: String,

    /// Service name used for registration and discovery.
    pub name: String,

    #[serde(alias = "tag")]
    pub tags: Vec<String>,

    /// Primary relational store.
    #[serde(alias = "mysql")]
    pub storage: StorageConfig,

    /// Alternate relational store.
    #[serde(alias = "dm")]
    pub secondary_storage: StorageConfig,

    #[serde(alias = "redis")]
    pub cache: CacheConfig,

    /// Message broker settings.
    #[serde(alias = "mq")]
    pub queue: QueueConfig,

    /// Logical role → discovery name of the services this one calls.
    #[serde(alias = "feign")]
    pub remote_services: BTreeMap<String, String>,

    #[serde(alias = "log")]
    pub logging: LoggingConfig,

    pub metrics: MetricsConfig,
}

/// Relational store endpoint.
#[derive(Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    pub host: String,
    #[serde(deserialize_with = "scalar_string")]
    pub port: String,
    #[serde(deserialize_with = "scalar_string")]
    pub username: String,
    #[serde(deserialize_with = "scalar_string")]
    pub password: String,
    pub database: String,
    /// Log every statement issued against this store.
    #[serde(alias = "showsql", alias = "showSql")]
    pub show_sql: bool,
}

/// Cache endpoint.
#[derive(Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheConfig {
    pub host: String,
    #[serde(deserialize_with = "scalar_string")]
    pub port: String,
    #[serde(deserialize_with = "scalar_string")]
    pub username: String,
    #[serde(deserialize_with = "scalar_string")]
    pub password: String,
    /// Numeric database index; always set once defaults are applied.
    #[serde(deserialize_with = "database_index")]
    pub database: Option<u32>,
}

impl CacheConfig {
    /// Database index, `0` if it was never set.
    pub fn database_index(&self) -> u32 {
        self.database.unwrap_or(0)
    }
}

/// Message broker endpoint.
#[derive(Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct QueueConfig {
    pub host: String,
    #[serde(deserialize_with = "scalar_string")]
    pub port: String,
    #[serde(deserialize_with = "scalar_string")]
    pub username: String,
    #[serde(deserialize_with = "scalar_string")]
    pub password: String,
    #[serde(alias = "virtualhost", alias = "virtualHost")]
    pub virtual_host: String,
    pub queues: Vec<String>,
    pub exchange: String,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log file, used when `style` is `file`.
    pub path: String,

    /// Release mode: compact machine-readable output.
    pub release: bool,

    /// Output style: `console`, `json` or `file`.
    pub style: String,
}

/// Prometheus exporter settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Environment variable names and literal fallbacks for one store.
struct StorageDefaults {
    host: (&'static str, &'static str),
    port: (&'static str, &'static str),
    username: (&'static str, &'static str),
    password: (&'static str, &'static str),
}

const PRIMARY_STORAGE: StorageDefaults = StorageDefaults {
    host: ("MYSQL_HOST", "127.0.0.1"),
    port: ("MYSQL_PORT", "3306"),
    username: ("MYSQL_USERNAME", "root"),
    password: ("MYSQL_PASSWD", "root"),
};

const SECONDARY_STORAGE: StorageDefaults = StorageDefaults {
    host: ("DM_HOST", "127.0.0.1"),
    port: ("DM_PORT", "5236"),
    username: ("DM_USERNAME", "SYSDBA"),
    password: ("DM_PASSWD", "SYSDBA"),
};

const DEFAULT_REMOTE_SERVICES: [(&str, &str); 5] = [
    ("da2", "us-da-v2"),
    ("da3", "us-da-v3"),
    ("diagram", "us-diagram"),
    ("manage", "us-manage"),
    ("equipment", "us-equipment"),
];

const DEFAULT_QUEUES: [&str; 3] = ["line", "diagram", "global"];

impl Config {
    /// Run the defaulting pass and return the completed snapshot.
    ///
    /// Deterministic for a given `env`: every required field is non-empty
    /// afterwards, and the tenant prefix is applied exactly once.
    pub fn with_defaults(mut self, env: &EnvDefaults) -> Self {
        fill(&mut self.name, || env.get("SERVER_NAME", DEFAULT_SERVICE_NAME));
        fill(&mut self.host, || env.get("SERVER_HOST", "127.0.0.1"));
        fill(&mut self.port, || env.get("SERVER_PORT", "8080"));

        let prefix = env.get(TENANT_PREFIX_VAR, "");

        self.storage.apply_defaults(env, &PRIMARY_STORAGE, &prefix);
        self.secondary_storage
            .apply_defaults(env, &SECONDARY_STORAGE, &prefix);
        self.cache.apply_defaults(env);
        self.queue.apply_defaults(env, &prefix);

        for (role, service) in DEFAULT_REMOTE_SERVICES {
            let entry = self.remote_services.entry(role.to_string()).or_default();
            fill(entry, || service.to_string());
        }

        fill(&mut self.logging.level, || "info".to_string());
        fill(&mut self.logging.path, || "logs/service.log".to_string());
        fill(&mut self.logging.style, || "console".to_string());
        fill(&mut self.metrics.address, || "0.0.0.0:9090".to_string());

        self
    }

    /// Discovery name configured for a logical role.
    pub fn remote_service(&self, role: &str) -> Option<&str> {
        self.remote_services.get(role).map(String::as_str)
    }
}

impl StorageConfig {
    fn apply_defaults(&mut self, env: &EnvDefaults, defaults: &StorageDefaults, prefix: &str) {
        fill(&mut self.host, || env.get(defaults.host.0, defaults.host.1));
        fill(&mut self.port, || env.get(defaults.port.0, defaults.port.1));
        fill(&mut self.username, || {
            env.get(defaults.username.0, defaults.username.1)
        });
        fill(&mut self.password, || {
            env.get(defaults.password.0, defaults.password.1)
        });
        fill(&mut self.database, || DEFAULT_DATABASE.to_string());
        self.database = format!("{}{}", prefix, self.database);
    }
}

impl CacheConfig {
    fn apply_defaults(&mut self, env: &EnvDefaults) {
        fill(&mut self.host, || env.get("REDIS_HOST", "127.0.0.1"));
        fill(&mut self.port, || env.get("REDIS_PORT", "18160"));
        // Credentials are optional for the cache and may stay empty.
        fill(&mut self.username, || env.get("REDIS_USERNAME", ""));
        fill(&mut self.password, || env.get("REDIS_PASSWD", ""));

        if self.database.is_none() {
            let raw = env.get("REDIS_DATABASE", "0");
            let index = raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Ignoring non-numeric REDIS_DATABASE");
                0
            });
            self.database = Some(index);
        }
    }
}

impl QueueConfig {
    fn apply_defaults(&mut self, env: &EnvDefaults, prefix: &str) {
        fill(&mut self.host, || env.get("RABBIT_HOST", "127.0.0.1"));
        fill(&mut self.port, || env.get("RABBIT_PORT", "5672"));
        fill(&mut self.username, || env.get("RABBIT_USERNAME", "us"));
        fill(&mut self.password, || env.get("RABBIT_PASSWD", "us"));
        fill(&mut self.virtual_host, || env.get("RABBIT_VHOST", "us"));
        self.virtual_host = format!("{}{}", prefix, self.virtual_host);
        fill(&mut self.exchange, || env.get("RABBIT_EXCHANGE", "push"));

        self.queues.retain(|q| !q.is_empty());
        if self.queues.is_empty() {
            self.queues = DEFAULT_QUEUES.iter().map(|q| q.to_string()).collect();
        }
    }
}

fn fill(field: &mut String, default: impl FnOnce() -> String) {
    if field.is_empty() {
        *field = default();
    }
}

/// Accept strings, numbers, booleans or null where a string is expected.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => String::new(),
        Some(Scalar::Str(s)) => s,
        Some(Scalar::Int(i)) => i.to_string(),
        Some(Scalar::Float(f)) => f.to_string(),
        Some(Scalar::Bool(b)) => b.to_string(),
    })
}

/// Accept a number or a numeric string; empty means unset.
fn database_index<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Index {
        Num(u32),
        Str(String),
    }

    match Option::<Index>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Index::Num(n)) => Ok(Some(n)),
        Some(Index::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(Index::Str(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid database index '{}'", s))),
    }
}

struct Redacted<'a>(&'a str);

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str("\"***\"")
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &Redacted(&self.password))
            .field("database", &self.database)
            .field("show_sql", &self.show_sql)
            .finish()
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &Redacted(&self.password))
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Debug for QueueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &Redacted(&self.password))
            .field("virtual_host", &self.virtual_host)
            .field("queues", &self.queues)
            .field("exchange", &self.exchange)
            .finish()
    }
}
