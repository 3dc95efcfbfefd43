//! Environment overrides for the configuration defaulting pass.
//!
//! # Design Decisions
//! - An empty variable counts as unset
//! - Lookups can be pinned to a fixed map so defaulting stays testable
//!   without touching the process environment

use std::collections::HashMap;

/// Where environment overrides are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvDefaults {
    /// Read from the process environment.
    #[default]
    Process,
    /// Read from a fixed set of pairs.
    Fixed(HashMap<String, String>),
}

impl EnvDefaults {
    /// Overrides backed by the process environment.
    pub fn process() -> Self {
        Self::Process
    }

    /// Overrides backed by an explicit set of pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Return the override for `key`, or `fallback` when it is unset or empty.
    pub fn get(&self, key: &str, fallback: &str) -> String {
        let value = match self {
            Self::Process => std::env::var(key).ok(),
            Self::Fixed(map) => map.get(key).cloned(),
        };

        match value {
            Some(v) if !v.is_empty() => v,
            _ => fallback.to_string(),
        }
    }
}
