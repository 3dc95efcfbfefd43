//! Registry identity of a running instance.

use std::fmt;

/// `name-host-port`, the key the registry uses for one instance.
///
/// Register and deregister both derive it through [`RegistryIdentity::new`]
/// so the two calls always address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryIdentity(String);

impl RegistryIdentity {
    pub fn new(service_name: &str, host: &str, port: u16) -> Self {
        Self(format!("{}-{}-{}", service_name, host, port))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegistryIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_format() {
        let id = RegistryIdentity::new("orders", "10.0.0.5", 8080);
        assert_eq!(id.as_str(), "orders-10.0.0.5-8080");
        assert_eq!(id.to_string(), "orders-10.0.0.5-8080");
    }

    #[test]
    fn test_identity_is_stable() {
        assert_eq!(
            RegistryIdentity::new("orders", "10.0.0.5", 8080),
            RegistryIdentity::new("orders", "10.0.0.5", 8080)
        );
    }

    #[test]
    fn test_identity_differs_per_component() {
        let base = RegistryIdentity::new("orders", "10.0.0.5", 8080);
        assert_ne!(base, RegistryIdentity::new("billing", "10.0.0.5", 8080));
        assert_ne!(base, RegistryIdentity::new("orders", "10.0.0.6", 8080));
        assert_ne!(base, RegistryIdentity::new("orders", "10.0.0.5", 8081));
    }
}
