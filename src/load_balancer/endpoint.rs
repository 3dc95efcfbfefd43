//! Discovered endpoint abstraction.

use std::fmt;

/// One currently healthy instance of a named service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Base URL callers prefix their request paths with.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.address, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let endpoint = Endpoint::new("10.1.2.3", 9000);
        assert_eq!(endpoint.base_url(), "http://10.1.2.3:9000/");
        assert_eq!(endpoint.to_string(), "10.1.2.3:9000");
    }
}
