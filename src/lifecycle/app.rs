//! Lifecycle coordinator for one service instance.
//!
//! # State machine
//! ```text
//! Constructed ──start()──▶ Started ──first failure | termination──▶ Terminating ──cleanup──▶ Stopped
//! ```
//!
//! `start()` launches two tasks that share only the failure queue:
//! registration (posts only on error) and the serve loop (always posts how it
//! ended). The coordinator reads the queue once; whichever task posts first
//! decides the outcome and later posts are dropped. Each task logs its own
//! failure before posting, so dropped failures still reach the log.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::sync::{mpsc, watch};

use crate::config::Config;
use crate::discovery::RegistryClient;
use crate::http::{AppContext, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::{signals, RunError};
use crate::net::listener::{self, ListenerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Constructed,
    Started,
    Terminating,
    Stopped,
}

/// Owns the listener wiring, the config snapshot and the failure queue.
pub struct App {
    ctx: AppContext,
    port: u16,
    server: Option<HttpServer>,
    failures_tx: Option<mpsc::Sender<RunError>>,
    failures: mpsc::Receiver<RunError>,
    shutdown: Shutdown,
    state: watch::Sender<LifecycleState>,
}

impl App {
    /// Wire the router and derive the port; nothing is bound yet.
    pub fn new<F>(
        config: Arc<Config>,
        registry: Arc<RegistryClient>,
        routes: F,
    ) -> Result<Self, RunError>
    where
        F: FnOnce(Router, &AppContext) -> Router,
    {
        let port = listener::parse_port(&config.port)?;
        let ctx = AppContext::new(config, registry);
        let server = HttpServer::new(&ctx, routes);
        let (failures_tx, failures) = mpsc::channel(1);

        Ok(Self {
            ctx,
            port,
            server: Some(server),
            failures_tx: Some(failures_tx),
            failures,
            shutdown: Shutdown::new(),
            state: watch::Sender::new(LifecycleState::Constructed),
        })
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.ctx.config
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Follow state transitions, including those made after `run_until`
    /// has taken ownership of the coordinator.
    pub fn watch_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Handle that closes the listener when triggered.
    pub fn closer(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Launch the registration and serve tasks. Only the first call has an effect.
    pub fn start(&mut self) {
        let (Some(tx), Some(server)) = (self.failures_tx.take(), self.server.take()) else {
            return;
        };
        self.transition(LifecycleState::Started);

        let registry = self.ctx.registry.clone();
        let config = self.ctx.config.clone();
        let port = self.port;
        let registration_tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = registry
                .register_tagged(&config.name, &config.host, port, &config.tags)
                .await
            {
                tracing::error!(service = %config.name, error = %e, "Registration failed");
                let _ = registration_tx.send(RunError::Registration(e)).await;
            }
        });

        let close = self.shutdown.wait();
        tokio::spawn(async move {
            let ended = match listener::bind(port).await {
                Ok(bound) => match server.run(bound, close).await {
                    Ok(()) => ListenerError::Closed,
                    Err(e) => e,
                },
                Err(e) => e,
            };

            match &ended {
                ListenerError::Closed => tracing::info!("Listener closed"),
                e => tracing::error!(error = %e, "Listener failed"),
            }
            let _ = tx.send(RunError::Listener(ended)).await;
        });
    }

    /// Run until SIGINT/SIGTERM or the first task failure, then clean up.
    ///
    /// Signal handlers are installed before the tasks are launched; calling
    /// [`App::start`] first leaves a window where a signal is not caught.
    pub async fn run(self) -> Result<(), RunError> {
        let terminate = signals::terminate();
        self.run_until(terminate).await
    }

    /// Run until `terminate` resolves or a task fails, then clean up.
    ///
    /// A task failure is returned as the error; termination yields `Ok(())`.
    /// Deregistration and listener close run exactly once either way.
    pub async fn run_until<T>(mut self, terminate: T) -> Result<(), RunError>
    where
        T: Future<Output = ()>,
    {
        self.start();

        let outcome = tokio::select! {
            failure = self.failures.recv() => {
                // Both tasks gone without a word means the serve loop ended.
                Err(failure.unwrap_or(RunError::Listener(ListenerError::Closed)))
            }
            _ = terminate => Ok(()),
        };

        self.transition(LifecycleState::Terminating);
        if let Err(e) = &outcome {
            tracing::error!(error = %e, "Service terminating after failure");
        }

        self.cleanup().await;
        self.transition(LifecycleState::Stopped);
        outcome
    }

    async fn cleanup(&self) {
        let config = &self.ctx.config;
        // Shutdown must not depend on the registry being reachable.
        let _ = self
            .ctx
            .registry
            .unregister(&config.name, &config.host, self.port)
            .await;
        self.shutdown.trigger();
    }

    fn transition(&mut self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        tracing::debug!(from = ?previous, to = ?next, "Lifecycle transition");
    }
}
