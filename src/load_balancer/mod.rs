//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Discovery lookup → passing endpoints (endpoint.rs)
//!     → Apply load balancing algorithm:
//!         - random.rs (uniform pick, no client-side state)
//!     → Return one endpoint or None
//! ```
//!
//! # Design Decisions
//! - Endpoint sets are recomputed per lookup; balancers never cache them
//! - Balancers only choose; health filtering happens before they run

pub mod endpoint;
pub mod random;

use std::fmt::Debug;

pub use endpoint::Endpoint;
pub use random::RandomBalancer;

/// Strategy for choosing one endpoint out of a healthy set.
pub trait LoadBalancer: Debug + Send + Sync {
    /// Pick an endpoint; `None` only when `endpoints` is empty.
    fn next_endpoint<'a>(&self, endpoints: &'a [Endpoint]) -> Option<&'a Endpoint>;
}
