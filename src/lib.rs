//! Service bootstrap library.
//!
//! Resolves service configuration from the registry's KV store (or a local
//! file), registers the instance with the discovery registry, and runs the
//! HTTP listener until the first failure or a termination signal.

pub mod config;
pub mod discovery;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;

pub use config::schema::Config;
pub use discovery::RegistryClient;
pub use http::{ApiResponse, AppContext};
pub use lifecycle::{App, Bootstrap, RunError};
