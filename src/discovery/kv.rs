//! KV listing against the registry's key-value store.

use reqwest::StatusCode;
use url::Url;

use crate::discovery::types::KvPair;
use crate::discovery::{api_url, expect_success, DiscoveryError, RegistryEndpoint};

/// One key/value pair, value still in its wire encoding.
#[derive(Debug, Clone)]
pub struct KvEntry(KvPair);

impl KvEntry {
    pub fn key(&self) -> &str {
        &self.0.key
    }

    /// Decoded value; `None` for keys that carry no data (folders).
    ///
    /// Decoding happens per entry, so a corrupt value under one key never
    /// affects reads of another.
    pub fn value(&self) -> Result<Option<Vec<u8>>, DiscoveryError> {
        self.0.decode_value().map_err(|e| DiscoveryError::Decode {
            key: self.0.key.clone(),
            reason: e.to_string(),
        })
    }
}

/// Read-only client for `/v1/kv`.
#[derive(Debug, Clone)]
pub struct KvClient {
    http: reqwest::Client,
    base: Url,
}

impl KvClient {
    pub fn new(endpoint: &RegistryEndpoint) -> Result<Self, DiscoveryError> {
        Ok(Self::with_client(reqwest::Client::new(), endpoint.base_url()?))
    }

    pub fn with_client(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    /// List every pair whose key starts with `prefix`.
    ///
    /// A prefix with no keys yields an empty list, not an error.
    pub async fn list(&self, prefix: &str) -> Result<Vec<KvEntry>, DiscoveryError> {
        let mut url = api_url(&self.base, ["v1", "kv"].into_iter().chain(prefix.split('/')))?;
        url.query_pairs_mut().append_pair("recurse", "true");

        tracing::debug!(prefix = %prefix, "Listing KV pairs");

        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let pairs: Vec<KvPair> = expect_success(response).await?.json().await?;
        Ok(pairs.into_iter().map(KvEntry).collect())
    }
}
