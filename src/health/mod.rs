//! Health subsystem.
//!
//! # Data Flow
//! ```text
//! Registry agent (every 30s, 20s timeout)
//!     → GET /health (endpoint.rs) → 200 "SUCCESS"
//!     → registry records check status
//!
//! Discovery lookup:
//!     registry entries + checks
//!     → state.rs (aggregate per instance)
//!     → only Passing instances are selectable
//! ```
//!
//! # Design Decisions
//! - Liveness only: the endpoint never consults downstream dependencies
//! - Aggregation follows the registry's own precedence rules

pub mod endpoint;
pub mod state;

pub use endpoint::{health, HEALTH_PATH};
pub use state::CheckStatus;
