//! Uniform random load balancing strategy.

use rand::seq::SliceRandom;

use crate::load_balancer::{endpoint::Endpoint, LoadBalancer};

/// Random selector.
/// Every endpoint in the set is equally likely; nothing is remembered between calls.
#[derive(Debug, Default)]
pub struct RandomBalancer;

impl RandomBalancer {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RandomBalancer {
    fn next_endpoint<'a>(&self, endpoints: &'a [Endpoint]) -> Option<&'a Endpoint> {
        endpoints.choose(&mut rand::thread_rng())
    }
}
