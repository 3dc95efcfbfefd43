//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Registry endpoint → Resolve config → Init logging/metrics → App::start
//!
//! Run (app.rs):
//!     registration task ─┐
//!                        ├─▶ failure queue ─┐
//!     serve task ────────┘                  ├─▶ select (first wins)
//!     signals.rs (SIGINT/SIGTERM) ──────────┘
//!
//! Shutdown (app.rs + shutdown.rs):
//!     Deregister (best-effort) → Close listener → Return outcome
//! ```
//!
//! # Design Decisions
//! - Failure → error result; termination signal → clean result
//! - Cleanup runs once on every exit path
//! - No timeouts on register, deregister or close

pub mod app;
pub mod shutdown;
pub mod signals;
pub mod startup;

use thiserror::Error;

use crate::config::ConfigError;
use crate::discovery::DiscoveryError;
use crate::net::ListenerError;
use crate::observability::logging::LoggingError;

pub use app::{App, LifecycleState};
pub use shutdown::Shutdown;
pub use startup::Bootstrap;

/// Why a service stopped, or failed to start.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The registry client could not be built.
    #[error("registry setup error: {0}")]
    Registry(#[source] DiscoveryError),

    /// The instance could not register itself.
    #[error("registration failed: {0}")]
    Registration(#[source] DiscoveryError),

    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("logging setup error: {0}")]
    Logging(#[from] LoggingError),
}

impl RunError {
    /// Startup errors that must never be retried.
    pub fn is_fatal(&self) -> bool {
        match self {
            RunError::Config(e) => e.is_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_malformed_config_is_fatal() {
        assert!(RunError::Config(ConfigError::Parse("bad yaml".into())).is_fatal());
        assert!(!RunError::Config(ConfigError::NotFound("orders".into())).is_fatal());
        assert!(!RunError::Listener(ListenerError::Closed).is_fatal());
        assert!(!RunError::Registration(DiscoveryError::NotFound("orders".into())).is_fatal());
    }
}
