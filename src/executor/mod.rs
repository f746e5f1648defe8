//! Call executor capability boundary.
//!
//! # Data Flow
//! ```text
//! CircuitGuard::call(target)
//!     → CallExecutor::invoke(target)   (one attempt, may block/await)
//!     → Ok(payload) | Err(error)       (classified by the breaker)
//! ```
//!
//! # Design Decisions
//! - The breaker depends on nothing but this trait; transport details
//!   (HTTP client, timeouts, TLS) live entirely behind it
//! - One `invoke` is one attempt; any internal retries the executor
//!   performs are invisible to the breaker
//! - A timed-out attempt surfaces as an ordinary `Err`

use async_trait::async_trait;

pub mod http;

pub use http::{HttpCallError, HttpExecutor};

/// Performs the actual outbound operation for a guarded call.
#[async_trait]
pub trait CallExecutor: Send + Sync {
    /// Successful result payload.
    type Payload: Send;

    /// Attempt failure reason.
    type Error: std::fmt::Display + Send;

    /// Perform one attempt against `target`.
    async fn invoke(&self, target: &str) -> Result<Self::Payload, Self::Error>;
}
