//! Shared utilities for integration tests: a mocked registry agent and
//! helpers for probing a running service.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::json;

use service_bootstrap::config::{Config, EnvDefaults};
use service_bootstrap::discovery::{RegistryClient, RegistryEndpoint};

/// Env source with nothing set, so only literal defaults apply.
pub fn no_env() -> EnvDefaults {
    EnvDefaults::from_pairs(Vec::<(String, String)>::new())
}

/// Env source pointing the registry endpoint at `server`.
pub fn registry_env(server: &MockServer) -> EnvDefaults {
    EnvDefaults::from_pairs([
        ("CONSUL_HOST".to_string(), server.host()),
        ("CONSUL_PORT".to_string(), server.port().to_string()),
    ])
}

pub fn registry_for(server: &MockServer) -> Arc<RegistryClient> {
    Arc::new(RegistryClient::new(&RegistryEndpoint::new(server.host(), server.port())).unwrap())
}

/// Fully defaulted config for `name` listening on `port`.
pub fn service_config(name: &str, port: u16) -> Arc<Config> {
    let config = Config {
        name: name.to_string(),
        host: "127.0.0.1".to_string(),
        port: port.to_string(),
        ..Config::default()
    };
    Arc::new(config.with_defaults(&no_env()))
}

/// Accept registrations for any service.
pub async fn mock_register(server: &MockServer, status: u16) -> Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/v1/agent/service/register");
            then.status(status);
        })
        .await
}

/// Accept deregistration of the instance `name` on 127.0.0.1:`port`.
pub async fn mock_deregister<'a>(server: &'a MockServer, name: &str, port: u16) -> Mock<'a> {
    let path = format!("/v1/agent/service/deregister/{}-127.0.0.1-{}", name, port);
    server
        .mock_async(|when, then| {
            when.method(PUT).path(path);
            then.status(200);
        })
        .await
}

/// KV listing body in the registry's wire format, values base64-encoded.
pub fn kv_body(pairs: &[(&str, Option<&str>)]) -> serde_json::Value {
    let entries: Vec<_> = pairs
        .iter()
        .map(|(key, value)| {
            let value = value.map(|v| base64::engine::general_purpose::STANDARD.encode(v));
            json!({ "Key": key, "Value": value, "Flags": 0 })
        })
        .collect();
    json!(entries)
}

/// Poll `url` until it answers, giving the serve task time to bind.
pub async fn wait_until_serving(url: &str) -> reqwest::Response {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(response) = client.get(url).send().await {
            return response;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("service at {} never came up", url);
}

/// Poll `mock` until it has been hit `hits` times; spawned tasks finish
/// their registry calls on their own schedule.
pub async fn wait_for_hits(mock: &Mock<'_>, hits: usize) {
    for _ in 0..50 {
        if mock.hits_async().await >= hits {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("mock was hit {} times, expected {}", mock.hits_async().await, hits);
}
