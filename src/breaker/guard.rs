//! Guarded call execution.
//!
//! # Responsibilities
//! - Ask the breaker for admission before touching the executor
//! - Invoke the executor at most once per call
//! - Settle the permit with the call's outcome
//!
//! # Design Decisions
//! - The executor runs outside the breaker's lock; the permit carries
//!   enough context to settle correctly afterwards
//! - Underlying errors are surfaced as `Failed`, not swallowed, so callers
//!   can still see why an attempt failed

use std::sync::Arc;

use super::outcome::CallOutcome;
use super::state::CircuitBreaker;
use crate::executor::CallExecutor;

/// A circuit breaker composed with the executor it protects.
pub struct CircuitGuard<E> {
    breaker: Arc<CircuitBreaker>,
    executor: Arc<E>,
}

impl<E: CallExecutor> CircuitGuard<E> {
    /// Wrap an executor with a breaker.
    pub fn new(breaker: Arc<CircuitBreaker>, executor: Arc<E>) -> Self {
        Self { breaker, executor }
    }

    /// Perform one guarded call against `target`.
    ///
    /// Consults the breaker, invokes the executor zero or one times, and
    /// applies the outcome to the machine before returning it.
    pub async fn call(&self, target: &str) -> CallOutcome<E::Payload, E::Error> {
        let permit = match self.breaker.admit().await {
            Ok(permit) => permit,
            Err(reason) => {
                tracing::debug!(url = target, %reason, "Call rejected by circuit breaker");
                return CallOutcome::Rejected(reason);
            }
        };

        match self.executor.invoke(target).await {
            Ok(payload) => {
                self.breaker.record_success(permit).await;
                CallOutcome::Success(payload)
            }
            Err(error) => {
                tracing::warn!(url = target, error = %error, "Upstream call failed");
                self.breaker.record_failure(permit).await;
                CallOutcome::Failed(error)
            }
        }
    }
}
