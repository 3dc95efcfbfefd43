//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the registry and KV clients from `CONSUL_HOST` / `CONSUL_PORT`
//! - Resolve the configuration snapshot
//! - Initialize logging and, when enabled, the metrics exporter
//! - Start the lifecycle coordinator and run startup hooks
//!
//! # Design Decisions
//! - Fail fast: config, logging-file and port errors abort startup
//! - Hooks run after both tasks are launched, like the serve loop they may depend on

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;

use crate::config::{Config, ConfigResolver, EnvDefaults};
use crate::discovery::{KvClient, RegistryClient, RegistryEndpoint};
use crate::http::AppContext;
use crate::lifecycle::app::App;
use crate::lifecycle::{signals, RunError};
use crate::observability::{logging, metrics};

type RouteWiring = Box<dyn FnOnce(Router, &AppContext) -> Router + Send>;
type StartHook = Box<dyn FnOnce(&Config) + Send>;

/// Entry point for a service: `Bootstrap::new("orders").routes(..).run().await`.
pub struct Bootstrap {
    service_name: String,
    env: EnvDefaults,
    local_dir: Option<PathBuf>,
    routes: RouteWiring,
    hooks: Vec<StartHook>,
}

impl Bootstrap {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            env: EnvDefaults::process(),
            local_dir: None,
            routes: Box::new(|router, _| router),
            hooks: Vec::new(),
        }
    }

    /// Source of environment overrides (process environment by default).
    pub fn env(mut self, env: EnvDefaults) -> Self {
        self.env = env;
        self
    }

    /// Directory searched for `*local` config files instead of the working directory.
    pub fn local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = Some(dir.into());
        self
    }

    /// Register the service's own routes next to `/health`.
    pub fn routes<F>(mut self, wiring: F) -> Self
    where
        F: FnOnce(Router, &AppContext) -> Router + Send + 'static,
    {
        self.routes = Box::new(wiring);
        self
    }

    /// Run `hook` with the resolved config once the service has started.
    pub fn on_start<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&Config) + Send + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Start the service and block until SIGINT/SIGTERM or the first failure.
    ///
    /// Signal handlers are installed before anything else, so a signal that
    /// arrives during startup still ends in a clean shutdown.
    pub async fn run(self) -> Result<(), RunError> {
        let terminate = signals::terminate();
        self.run_until(terminate).await
    }

    /// Like [`Bootstrap::run`], with a custom termination future.
    pub async fn run_until<T>(self, terminate: T) -> Result<(), RunError>
    where
        T: Future<Output = ()>,
    {
        let endpoint = RegistryEndpoint::from_env(&self.env);
        let kv = KvClient::new(&endpoint).map_err(RunError::Registry)?;
        let registry = Arc::new(RegistryClient::new(&endpoint).map_err(RunError::Registry)?);

        let mut resolver = ConfigResolver::new(kv, self.env.clone());
        if let Some(dir) = self.local_dir {
            resolver = resolver.with_local_dir(dir);
        }
        let config = Arc::new(resolver.read_config(&self.service_name).await?);

        match logging::init(&config.logging) {
            Ok(()) | Err(logging::LoggingError::AlreadyInstalled) => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!(service = %config.name, config = ?config, "Read config");

        if config.metrics.enabled {
            match config.metrics.address.parse::<SocketAddr>() {
                Ok(addr) => {
                    if let Err(e) = metrics::init_metrics(addr) {
                        tracing::error!(error = %e, "Failed to start metrics exporter");
                    }
                }
                Err(_) => tracing::error!(
                    metrics_address = %config.metrics.address,
                    "Failed to parse metrics address"
                ),
            }
        }

        let mut app = App::new(config.clone(), registry, self.routes)?;
        app.start();

        for hook in self.hooks {
            hook(&config);
        }

        tracing::info!(service = %config.name, port = app.port(), "Service started");
        app.run_until(terminate).await
    }
}
