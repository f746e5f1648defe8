//! HTTP call executor.
//!
//! # Responsibilities
//! - Perform a single GET against the target URL
//! - Enforce connect and request timeouts
//! - Classify non-2xx responses and transport errors as failures
//!
//! # Design Decisions
//! - Timeouts are failures like any other; the breaker never waits
//! - 2xx bodies are decoded as JSON when possible, otherwise passed
//!   through as a string payload

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::CallExecutor;
use crate::config::TimeoutConfig;

/// Error from a single HTTP attempt.
#[derive(Debug, thiserror::Error)]
pub enum HttpCallError {
    /// Connection, DNS, TLS, or timeout error.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("upstream returned status {0}")]
    Status(u16),
}

/// Call executor backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    /// Build an executor with the configured timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CallExecutor for HttpExecutor {
    type Payload = Value;
    type Error = HttpCallError;

    async fn invoke(&self, target: &str) -> Result<Value, HttpCallError> {
        let response = self.client.get(target).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpCallError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let payload = serde_json::from_slice(&body).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        });
        Ok(payload)
    }
}
