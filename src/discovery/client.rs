//! Registry client: registration, deregistration and healthy lookup.
//!
//! # Responsibilities
//! - Register this instance with an HTTP health check on `/health`
//! - Deregister it under the same identity on shutdown
//! - Resolve a service name to one passing instance
//!
//! # Design Decisions
//! - Errors surface unchanged; the lifecycle decides what is fatal
//! - Every lookup queries the registry again (no endpoint cache)

use url::Url;

use crate::discovery::identity::RegistryIdentity;
use crate::discovery::types::{ServiceCheck, ServiceEntry, ServiceRegistration};
use crate::discovery::{api_url, expect_success, DiscoveryError, RegistryEndpoint};
use crate::load_balancer::{Endpoint, LoadBalancer, RandomBalancer};
use crate::observability::metrics;

/// Client for the registry agent API.
#[derive(Debug)]
pub struct RegistryClient {
    http: reqwest::Client,
    base: Url,
    balancer: Box<dyn LoadBalancer>,
}

impl RegistryClient {
    /// Create a client with uniform random selection.
    pub fn new(endpoint: &RegistryEndpoint) -> Result<Self, DiscoveryError> {
        Ok(Self::with_client(reqwest::Client::new(), endpoint.base_url()?))
    }

    pub fn with_client(http: reqwest::Client, base: Url) -> Self {
        Self {
            http,
            base,
            balancer: Box::new(RandomBalancer::new()),
        }
    }

    /// Replace the selection strategy used by [`RegistryClient::discover_healthy`].
    pub fn with_balancer(mut self, balancer: impl LoadBalancer + 'static) -> Self {
        self.balancer = Box::new(balancer);
        self
    }

    /// Register `service_name` at `host:port`.
    pub async fn register(
        &self,
        service_name: &str,
        host: &str,
        port: u16,
    ) -> Result<(), DiscoveryError> {
        self.register_tagged(service_name, host, port, &[]).await
    }

    /// Register with registry tags attached.
    pub async fn register_tagged(
        &self,
        service_name: &str,
        host: &str,
        port: u16,
        tags: &[String],
    ) -> Result<(), DiscoveryError> {
        let id = RegistryIdentity::new(service_name, host, port);
        let registration = ServiceRegistration {
            id: id.to_string(),
            name: service_name.to_string(),
            address: host.to_string(),
            port,
            tags: tags.to_vec(),
            check: ServiceCheck::http_health(host, port),
        };

        let url = api_url(&self.base, ["v1", "agent", "service", "register"])?;
        let result = self.put_json(url, Some(&registration)).await;
        metrics::record_registration(result.is_ok());

        match &result {
            Ok(()) => tracing::info!(id = %id, check = %registration.check.http, "Service registered"),
            Err(e) => tracing::warn!(id = %id, error = %e, "Service registration failed"),
        }
        result
    }

    /// Remove the registration for `service_name` at `host:port`.
    ///
    /// Unknown identities are not special-cased; callers treat this as best-effort.
    pub async fn unregister(
        &self,
        service_name: &str,
        host: &str,
        port: u16,
    ) -> Result<(), DiscoveryError> {
        let id = RegistryIdentity::new(service_name, host, port);
        let url = api_url(
            &self.base,
            ["v1", "agent", "service", "deregister", id.as_str()],
        )?;

        let result = self.put_json::<()>(url, None).await;
        metrics::record_deregistration(result.is_ok());

        match &result {
            Ok(()) => tracing::info!(id = %id, "Service deregistered"),
            Err(e) => tracing::warn!(id = %id, error = %e, "Service deregistration failed"),
        }
        result
    }

    /// All instances of `service_name` whose aggregated status is passing.
    pub async fn healthy_endpoints(
        &self,
        service_name: &str,
    ) -> Result<Vec<Endpoint>, DiscoveryError> {
        let mut url = api_url(&self.base, ["v1", "health", "service", service_name])?;
        url.query_pairs_mut().append_pair("passing", "true");

        let response = self.http.get(url).send().await?;
        let entries: Vec<ServiceEntry> = expect_success(response).await?.json().await?;

        let total = entries.len();
        let healthy: Vec<Endpoint> = entries
            .iter()
            .filter(|entry| entry.aggregated_status().is_passing())
            .map(|entry| Endpoint::new(entry.address(), entry.service.port))
            .collect();

        tracing::debug!(
            service = %service_name,
            total,
            healthy = healthy.len(),
            "Registry lookup"
        );
        Ok(healthy)
    }

    /// Base URL of one passing instance of `service_name`, chosen by the balancer.
    pub async fn discover_healthy(&self, service_name: &str) -> Result<String, DiscoveryError> {
        let endpoints = match self.healthy_endpoints(service_name).await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                metrics::record_discovery(service_name, "error");
                return Err(e);
            }
        };

        match self.balancer.next_endpoint(&endpoints) {
            Some(endpoint) => {
                metrics::record_discovery(service_name, "found");
                Ok(endpoint.base_url())
            }
            None => {
                metrics::record_discovery(service_name, "not_found");
                Err(DiscoveryError::NotFound(service_name.to_string()))
            }
        }
    }

    async fn put_json<T: serde::Serialize>(
        &self,
        url: Url,
        body: Option<&T>,
    ) -> Result<(), DiscoveryError> {
        let mut request = self.http.put(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        expect_success(request.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> RegistryClient {
        RegistryClient::new(&RegistryEndpoint::new(server.host(), server.port())).unwrap()
    }

    fn entry(address: &str, port: u16, statuses: &[&str]) -> serde_json::Value {
        let checks: Vec<_> = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| json!({"CheckID": format!("check-{}", i), "Status": s}))
            .collect();
        json!({
            "Node": {"Address": "10.0.0.1"},
            "Service": {"ID": format!("svc-{}-{}", address, port), "Service": "svc", "Address": address, "Port": port},
            "Checks": checks
        })
    }

    #[tokio::test]
    async fn test_register_sends_identity_and_check() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/v1/agent/service/register")
                .json_body(json!({
                    "ID": "orders-10.0.0.5-8080",
                    "Name": "orders",
                    "Address": "10.0.0.5",
                    "Port": 8080,
                    "Check": {
                        "HTTP": "http://10.0.0.5:8080/health",
                        "Method": "GET",
                        "Interval": "30s",
                        "Timeout": "20s",
                        "Status": "passing"
                    }
                }));
            then.status(200);
        });

        client_for(&server)
            .register("orders", "10.0.0.5", 8080)
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_register_and_unregister_share_identity() {
        let server = MockServer::start();
        let register = server.mock(|when, then| {
            when.method(PUT)
                .path("/v1/agent/service/register")
                .body_contains("\"ID\":\"orders-10.0.0.5-8080\"");
            then.status(200);
        });
        let deregister = server.mock(|when, then| {
            when.method(PUT)
                .path("/v1/agent/service/deregister/orders-10.0.0.5-8080");
            then.status(200);
        });

        let client = client_for(&server);
        client.register("orders", "10.0.0.5", 8080).await.unwrap();
        client.unregister("orders", "10.0.0.5", 8080).await.unwrap();

        register.assert();
        deregister.assert();
    }

    #[tokio::test]
    async fn test_register_failure_surfaces_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PUT).path("/v1/agent/service/register");
            then.status(500).body("agent unavailable");
        });

        let err = client_for(&server)
            .register("orders", "10.0.0.5", 8080)
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(matches!(err, DiscoveryError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_transport_error() {
        // Nothing listens on port 1.
        let client = RegistryClient::new(&RegistryEndpoint::new("127.0.0.1", 1)).unwrap();
        let err = client.discover_healthy("orders").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Transport(_)));
    }

    #[tokio::test]
    async fn test_discover_filters_non_passing() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/health/service/orders")
                .query_param("passing", "true");
            then.status(200).json_body(json!([
                entry("10.0.0.5", 8080, &["passing", "critical"]),
                entry("10.0.0.6", 8080, &["passing", "passing"]),
                entry("10.0.0.7", 8080, &["warning"]),
            ]));
        });

        let client = client_for(&server);
        for _ in 0..20 {
            let url = client.discover_healthy("orders").await.unwrap();
            assert_eq!(url, "http://10.0.0.6:8080/");
        }
        mock.assert_hits(20);
    }

    #[tokio::test]
    async fn test_discover_empty_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/health/service/orders");
            then.status(200).json_body(json!([]));
        });

        let err = client_for(&server)
            .discover_healthy("orders")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_discover_no_passing_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/health/service/orders");
            then.status(200)
                .json_body(json!([entry("10.0.0.5", 8080, &["critical"])]));
        });

        let err = client_for(&server)
            .discover_healthy("orders")
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::NotFound(ref name) if name == "orders"));
    }

    #[tokio::test]
    async fn test_discover_spreads_across_healthy() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/health/service/orders");
            then.status(200).json_body(json!([
                entry("10.0.0.5", 8080, &["passing"]),
                entry("10.0.0.6", 8080, &["passing"]),
            ]));
        });

        let client = client_for(&server);
        let (mut a, mut b) = (0, 0);
        for _ in 0..200 {
            match client.discover_healthy("orders").await.unwrap().as_str() {
                "http://10.0.0.5:8080/" => a += 1,
                "http://10.0.0.6:8080/" => b += 1,
                other => panic!("unexpected endpoint {}", other),
            }
        }
        assert!(a > 50 && b > 50, "a={} b={}", a, b);
    }

    #[derive(Debug)]
    struct LastBalancer;

    impl LoadBalancer for LastBalancer {
        fn next_endpoint<'a>(&self, endpoints: &'a [Endpoint]) -> Option<&'a Endpoint> {
            endpoints.last()
        }
    }

    #[tokio::test]
    async fn test_custom_balancer_sees_only_passing() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/health/service/orders");
            then.status(200).json_body(json!([
                entry("10.0.0.5", 8080, &["passing"]),
                entry("10.0.0.6", 8080, &["passing"]),
                entry("10.0.0.7", 8080, &["critical"]),
            ]));
        });

        let client = client_for(&server).with_balancer(LastBalancer);
        for _ in 0..5 {
            let url = client.discover_healthy("orders").await.unwrap();
            assert_eq!(url, "http://10.0.0.6:8080/");
        }
    }
}
