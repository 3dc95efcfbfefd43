//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (registry calls, lookups, served requests)
//!
//! Consumers:
//!     → stdout / log file
//!     → Prometheus scrape (when metrics.enabled)
//! ```

pub mod logging;
pub mod metrics;
