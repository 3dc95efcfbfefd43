//! OS signal handling.
//!
//! SIGINT (Ctrl+C) and SIGTERM both mean "terminate cleanly".
//!
//! Handlers are installed when [`terminate`] is called, not when its future is
//! first polled, so a signal raised while the service is still starting is
//! held until the coordinator looks at it.

use std::future::Future;

/// Install SIGINT/SIGTERM handlers and return a future resolving on either.
///
/// Must be called from within a Tokio runtime. A handler that fails to
/// install never fires; the other one still does.
#[cfg(unix)]
pub fn terminate() -> impl Future<Output = ()> + Send + 'static {
    use tokio::signal::unix::{signal, Signal, SignalKind};

    fn install(kind: SignalKind, name: &'static str) -> Option<Signal> {
        match signal(kind) {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::error!(signal = name, error = %e, "Failed to install signal handler");
                None
            }
        }
    }

    async fn received(stream: Option<Signal>) {
        match stream {
            Some(mut stream) => {
                stream.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    let interrupt = install(SignalKind::interrupt(), "SIGINT");
    let term = install(SignalKind::terminate(), "SIGTERM");

    async move {
        let signal = tokio::select! {
            _ = received(interrupt) => "SIGINT",
            _ = received(term) => "SIGTERM",
        };
        tracing::info!(signal, "Termination signal received");
    }
}

/// Resolve on Ctrl+C.
#[cfg(not(unix))]
pub fn terminate() -> impl Future<Output = ()> + Send + 'static {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!(signal = "SIGINT", "Termination signal received");
    }
}
