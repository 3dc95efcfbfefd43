//! TCP listener binding and listener-level errors.
//!
//! # Responsibilities
//! - Derive the bind address from the configured port
//! - Bind the socket the HTTP server accepts on
//! - Describe how a serve loop ended

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Configured port is not a valid TCP port.
    InvalidPort(String),
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// The serve loop failed while accepting or serving.
    Serve(std::io::Error),
    /// The listener was closed from outside and the serve loop exited.
    Closed,
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::InvalidPort(p) => write!(f, "Invalid port: '{}'", p),
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Serve(e) => write!(f, "Server error: {}", e),
            ListenerError::Closed => write!(f, "Server closed"),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind(e) | ListenerError::Serve(e) => Some(e),
            _ => None,
        }
    }
}

/// Parse the configured port text.
pub fn parse_port(raw: &str) -> Result<u16, ListenerError> {
    raw.trim()
        .parse()
        .map_err(|_| ListenerError::InvalidPort(raw.to_string()))
}

/// Bind on all interfaces at `port`.
pub async fn bind(port: u16) -> Result<TcpListener, ListenerError> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;

    let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;
    tracing::info!(address = %local_addr, "Listener bound");

    Ok(listener)
}
