//! Per-endpoint breaker partitioning.
//!
//! # Responsibilities
//! - Own the mapping from endpoint key to its circuit breaker
//! - Create breakers lazily on first use, all with the same configuration
//! - Provide a snapshot of every breaker for status reporting
//!
//! # Design Decisions
//! - Endpoint key is `METHOD:url`; different endpoints are fully
//!   independent state machines
//! - DashMap keeps per-key creation concurrent without a registry-wide lock

use std::sync::Arc;

use dashmap::DashMap;

use super::state::{BreakerStatus, CircuitBreaker};
use crate::config::BreakerConfig;

/// Registry of circuit breakers, one per endpoint key.
#[derive(Debug)]
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    /// Create an empty registry; breakers inherit `config`.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Build the endpoint key for a method/url pair.
    pub fn endpoint_key(method: &str, url: &str) -> String {
        format!("{}:{}", method, url)
    }

    /// Get the breaker for `key`, creating it on first use.
    pub fn get(&self, key: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.config.clone())))
            .clone()
    }

    /// Snapshot of every breaker, sorted by endpoint key.
    pub async fn snapshot(&self) -> Vec<(String, BreakerStatus)> {
        let breakers: Vec<(String, Arc<CircuitBreaker>)> = self
            .breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut statuses = Vec::with_capacity(breakers.len());
        for (key, breaker) in breakers {
            statuses.push((key, breaker.status().await));
        }
        statuses.sort_by(|a, b| a.0.cmp(&b.0));
        statuses
    }
}
