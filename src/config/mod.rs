//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! service name
//!     → loader.rs: "*local" → <name>.yaml|.yml|.toml in the working dir
//!                  otherwise → KV listing under <name>, exact key match
//!     → loader.rs: parse (serde_yaml / toml)
//!     → schema.rs: defaulting pass (env.rs lookups, then literals)
//!     → Config (complete, immutable)
//!     → shared via Arc with the lifecycle and its tasks
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; a different config means a new snapshot
//! - Fetching text is separate from parse+default so the latter stays pure
//! - Parse errors are fatal and surface as typed errors, never panics

pub mod env;
pub mod loader;
pub mod schema;

pub use env::EnvDefaults;
pub use loader::{parse_config, parse_config_with, ConfigError, ConfigFormat, ConfigResolver};
pub use schema::{
    CacheConfig, Config, LoggingConfig, MetricsConfig, QueueConfig, StorageConfig,
};
