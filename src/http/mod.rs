//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/access_log.rs (skip /health, log + count the rest)
//!     → /health or caller routes
//!     → response.rs (uniform JSON envelope)
//!     → Send to client
//! ```

pub mod middleware;
pub mod response;
pub mod server;

pub use response::ApiResponse;
pub use server::{AppContext, HttpServer};
