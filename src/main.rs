//! Service bootstrap demo binary.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────────────┐
//!                 │                   SERVICE INSTANCE                    │
//!                 │                                                       │
//!  service name ──┼─▶ config resolver ──▶ Config (immutable, Arc)         │
//!                 │      │   ▲                    │                       │
//!                 │      │   └── env defaults     ▼                       │
//!                 │      │                 lifecycle coordinator          │
//!                 │      ▼                  │              │              │
//!   Consul KV ◀───┼── kv client      register task     serve task ◀──────┼── HTTP clients
//!                 │                         │              │              │
//!   Consul agent ◀┼── registry client ◀─────┘              ▼              │
//!                 │      │                    failure queue ──▶ select ◀──┼── SIGINT/SIGTERM
//!                 │      ▼                                        │       │
//!                 │  healthy lookup + random pick        deregister, close│
//!                 └───────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use axum::{extract::Path, routing::get};
use clap::Parser;
use service_bootstrap::{ApiResponse, Bootstrap};

#[derive(Parser)]
#[command(name = "service-bootstrap")]
#[command(about = "Run a service registered with the discovery registry", long_about = None)]
struct Cli {
    /// Service name; names ending in "local" read <name>.yaml from the working directory.
    #[arg(short, long, default_value = "us-diagram")]
    service: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = Bootstrap::new(cli.service)
        .routes(|router, ctx| {
            let name = ctx.config.name.clone();
            let upstream = ctx.clone();
            router
                .route(
                    "/",
                    get(move || async move {
                        ApiResponse::ok().with_data(serde_json::json!({ "service": name }))
                    }),
                )
                .route(
                    "/upstream/{role}",
                    get(move |Path(role): Path<String>| async move {
                        match upstream.discover(&role).await {
                            Ok(url) => ApiResponse::ok().with_data(url),
                            Err(e) if e.is_not_found() => ApiResponse::param_error()
                                .with_message(format!("no healthy instance for '{}'", role)),
                            Err(e) => ApiResponse::server_error().with_stacks(&e),
                        }
                    }),
                )
        })
        .on_start(|config| {
            tracing::info!(
                database = %config.storage.database,
                queues = ?config.queue.queues,
                "Startup hooks complete"
            );
        })
        .run()
        .await;

    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, fatal = e.is_fatal(), "Service stopped");
            eprintln!("service stopped: {}", e);
            // 2: malformed configuration, not worth restarting.
            if e.is_fatal() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
