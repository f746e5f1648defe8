//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds and timeouts > 0)
//! - Check upstream names are unique and URLs well-formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("breaker failure_threshold must be greater than 0")]
    ZeroFailureThreshold,

    #[error("breaker retry_timeout_ms must be greater than 0")]
    ZeroRetryTimeout,

    #[error("upstream at index {0} has an empty name")]
    EmptyUpstreamName(usize),

    #[error("duplicate upstream name '{0}'")]
    DuplicateUpstreamName(String),

    #[error("upstream '{name}' has an invalid url '{url}'")]
    InvalidUpstreamUrl { name: String, url: String },
}

/// Check the configuration for semantic errors, collecting all of them.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold);
    }
    if config.breaker.retry_timeout_ms == 0 {
        errors.push(ValidationError::ZeroRetryTimeout);
    }

    let mut seen = HashSet::new();
    for (index, upstream) in config.upstreams.iter().enumerate() {
        if upstream.name.is_empty() {
            errors.push(ValidationError::EmptyUpstreamName(index));
        } else if !seen.insert(upstream.name.clone()) {
            errors.push(ValidationError::DuplicateUpstreamName(upstream.name.clone()));
        }

        if Url::parse(&upstream.url).is_err() {
            errors.push(ValidationError::InvalidUpstreamUrl {
                name: upstream.name.clone(),
                url: upstream.url.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
