//! Consul HTTP API payloads.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::health::state::CheckStatus;

/// Health check interval the registry polls at.
pub const CHECK_INTERVAL: &str = "30s";
/// Per-probe timeout for the health check.
pub const CHECK_TIMEOUT: &str = "20s";

/// Body of `PUT /v1/agent/service/register`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRegistration {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub check: ServiceCheck,
}

/// HTTP health check attached to a registration.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceCheck {
    #[serde(rename = "HTTP")]
    pub http: String,
    pub method: String,
    pub interval: String,
    pub timeout: String,
    /// Initial status, so the instance is routable before the first probe.
    pub status: String,
}

impl ServiceCheck {
    /// GET check against `http://{host}:{port}/health`.
    pub fn http_health(host: &str, port: u16) -> Self {
        Self {
            http: format!("http://{}:{}/health", host, port),
            method: "GET".to_string(),
            interval: CHECK_INTERVAL.to_string(),
            timeout: CHECK_TIMEOUT.to_string(),
            status: CheckStatus::Passing.as_str().to_string(),
        }
    }
}

/// One entry of `GET /v1/kv/{prefix}?recurse=true`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KvPair {
    pub key: String,
    /// Base64-encoded value; null for keys without data.
    #[serde(default)]
    pub value: Option<String>,
}

impl KvPair {
    pub fn decode_value(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        self.value
            .as_deref()
            .map(|v| base64::engine::general_purpose::STANDARD.decode(v))
            .transpose()
    }
}

/// One entry of `GET /v1/health/service/{name}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceEntry {
    #[serde(default)]
    pub node: Option<Node>,
    pub service: AgentService,
    #[serde(default)]
    pub checks: Vec<HealthCheck>,
}

impl ServiceEntry {
    /// Service address, falling back to the node address when unset.
    pub fn address(&self) -> &str {
        if !self.service.address.is_empty() {
            return &self.service.address;
        }
        self.node
            .as_ref()
            .map(|n| n.address.as_str())
            .unwrap_or_default()
    }

    /// Combined verdict over all checks of this entry.
    pub fn aggregated_status(&self) -> CheckStatus {
        CheckStatus::aggregate(self.checks.iter().map(|c| (c.check_id.as_str(), c.status.as_str())))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Node {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentService {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheck {
    #[serde(rename = "CheckID", default)]
    pub check_id: String,
    pub status: String,
}
