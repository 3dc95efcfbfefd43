//! Network layer.
//!
//! # Data Flow
//! ```text
//! config.port → listener.rs (parse, bind 0.0.0.0:port)
//!     → http::server (accept + serve until closed)
//!     → ListenerError describes how serving ended
//! ```

pub mod listener;

pub use listener::ListenerError;
