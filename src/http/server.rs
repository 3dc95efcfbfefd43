//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: mandatory `/health` plus caller routes
//! - Wire up middleware (request id, access log, tracing)
//! - Serve on a bound listener until told to close

use std::future::Future;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::discovery::{DiscoveryError, RegistryClient};
use crate::health::{health, HEALTH_PATH};
use crate::http::middleware::access_log;
use crate::net::ListenerError;

/// What route wiring gets to see: the resolved config and the registry.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub registry: Arc<RegistryClient>,
}

impl AppContext {
    pub fn new(config: Arc<Config>, registry: Arc<RegistryClient>) -> Self {
        Self { config, registry }
    }

    /// Base URL of a healthy instance of the service configured for `role`.
    pub async fn discover(&self, role: &str) -> Result<String, DiscoveryError> {
        let service = self
            .config
            .remote_service(role)
            .ok_or_else(|| DiscoveryError::NotFound(role.to_string()))?;
        self.registry.discover_healthy(service).await
    }
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server; `routes` must not register `/health` itself.
    pub fn new<F>(ctx: &AppContext, routes: F) -> Self
    where
        F: FnOnce(Router, &AppContext) -> Router,
    {
        let base = Router::new().route(HEALTH_PATH, get(health));
        let router = Self::build_router(routes(base, ctx));
        Self { router }
    }

    fn build_router(routes: Router) -> Router {
        routes
            // A panicking handler becomes a 500 instead of a dropped connection.
            .layer(CatchPanicLayer::new())
            .layer(axum::middleware::from_fn(access_log))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// Returns `Ok(())` only when the shutdown future ended the loop.
    pub async fn run<S>(self, listener: TcpListener, shutdown: S) -> Result<(), ListenerError>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "HTTP server starting");
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ListenerError::Serve)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvDefaults;
    use crate::discovery::RegistryEndpoint;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn context() -> AppContext {
        let config = Config::default().with_defaults(&EnvDefaults::from_pairs(Vec::<(String, String)>::new()));
        let registry = RegistryClient::new(&RegistryEndpoint::new("127.0.0.1", 1)).unwrap();
        AppContext::new(Arc::new(config), Arc::new(registry))
    }

    async fn get_body(router: Router, uri: &str) -> (StatusCode, String, bool) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let has_request_id = response.headers().contains_key("x-request-id");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap(), has_request_id)
    }

    #[tokio::test]
    async fn test_health_always_available() {
        let server = HttpServer::new(&context(), |router, _| router);
        let (status, body, has_request_id) = get_body(server.router(), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "\"SUCCESS\"");
        assert!(has_request_id);
    }

    #[tokio::test]
    async fn test_caller_routes_see_context() {
        let server = HttpServer::new(&context(), |router, ctx| {
            let name = ctx.config.name.clone();
            router.route("/name", get(move || async move { name }))
        });

        let (status, body, _) = get_body(server.router(), "/name").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, crate::config::schema::DEFAULT_SERVICE_NAME);

        let (status, _, _) = get_body(server.router(), "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handler_panic_is_server_error() {
        async fn explode() -> &'static str {
            panic!("handler failed")
        }

        let server = HttpServer::new(&context(), |router, _| router.route("/explode", get(explode)));

        let (status, _, has_request_id) = get_body(server.router(), "/explode").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(has_request_id);

        let (status, _, _) = get_body(server.router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_discover_unknown_role() {
        let err = context().discover("no-such-role").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
