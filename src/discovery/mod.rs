//! Discovery registry subsystem.
//!
//! # Data Flow
//! ```text
//! RegistryEndpoint (CONSUL_HOST / CONSUL_PORT)
//!     → kv.rs      (KV listing, used by the config resolver)
//!     → client.rs  (register / deregister / healthy lookup)
//!         → health::state (aggregated check status)
//!         → load_balancer (uniform pick among passing instances)
//! ```
//!
//! # Design Decisions
//! - Talks to the Consul HTTP API directly over reqwest
//! - No retries, no backoff, no caching: callers own the policy
//! - One client per process, passed explicitly to whoever needs it

pub mod client;
pub mod identity;
pub mod kv;
pub mod types;

use thiserror::Error;
use url::Url;

use crate::config::env::EnvDefaults;

pub use client::RegistryClient;
pub use identity::RegistryIdentity;
pub use kv::{KvClient, KvEntry};

/// Errors returned by registry and KV calls.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The query succeeded but no passing instance exists.
    #[error("service ( {0} ) was not found")]
    NotFound(String),

    /// Network-level failure talking to the registry.
    #[error("registry transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The registry answered with a non-success status.
    #[error("registry returned {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    /// The registry address could not be turned into a URL.
    #[error("invalid registry endpoint: {0}")]
    InvalidEndpoint(String),

    /// A KV value was not valid base64.
    #[error("invalid value for key '{key}': {reason}")]
    Decode { key: String, reason: String },
}

impl DiscoveryError {
    /// True when the lookup succeeded but found nothing usable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiscoveryError::NotFound(_))
    }

    /// True when the registry itself could not be reached or refused the call.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DiscoveryError::Transport(_) | DiscoveryError::Status { .. }
        )
    }
}

/// Network coordinates of the registry agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEndpoint {
    pub host: String,
    pub port: String,
}

impl RegistryEndpoint {
    pub fn new(host: impl Into<String>, port: impl ToString) -> Self {
        Self {
            host: host.into(),
            port: port.to_string(),
        }
    }

    /// Coordinates from `CONSUL_HOST` / `CONSUL_PORT`.
    pub fn from_env(env: &EnvDefaults) -> Self {
        Self {
            host: env.get("CONSUL_HOST", "127.0.0.1"),
            port: env.get("CONSUL_PORT", "8500"),
        }
    }

    /// Base URL of the agent's HTTP API.
    pub fn base_url(&self) -> Result<Url, DiscoveryError> {
        let raw = format!("http://{}:{}/", self.host, self.port);
        Url::parse(&raw).map_err(|e| DiscoveryError::InvalidEndpoint(format!("{}: {}", raw, e)))
    }
}

/// Build `base` + path segments, percent-encoding each segment.
pub(crate) fn api_url<'a, I>(base: &Url, segments: I) -> Result<Url, DiscoveryError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| DiscoveryError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-success response into `DiscoveryError::Status`.
pub(crate) async fn expect_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, DiscoveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(DiscoveryError::Status {
        status: status.as_u16(),
        url,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_env() {
        let env = EnvDefaults::from_pairs([("CONSUL_HOST", "consul.internal")]);
        let endpoint = RegistryEndpoint::from_env(&env);

        assert_eq!(endpoint, RegistryEndpoint::new("consul.internal", "8500"));
        assert_eq!(
            endpoint.base_url().unwrap().as_str(),
            "http://consul.internal:8500/"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let endpoint = RegistryEndpoint::new("bad host", "port");
        assert!(matches!(
            endpoint.base_url(),
            Err(DiscoveryError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_api_url_encodes_segments() {
        let base = Url::parse("http://127.0.0.1:8500/").unwrap();
        let url = api_url(&base, ["v1", "agent", "service", "deregister", "svc-10.0.0.1-80"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8500/v1/agent/service/deregister/svc-10.0.0.1-80"
        );

        let url = api_url(&base, ["v1", "health", "service", "a b"]).unwrap();
        assert_eq!(url.path(), "/v1/health/service/a%20b");
    }
}
