//! Outcome types for guarded calls.
//!
//! A guarded call never panics and never raises: every path ends in one of
//! the three `CallOutcome` variants. `Rejected` means the breaker declined
//! to attempt the call at all; `Failed` means the call was attempted and
//! the upstream failed (which counts toward opening the circuit).

use std::time::Duration;

/// Result of a call made through a circuit breaker.
#[derive(Debug)]
pub enum CallOutcome<T, E> {
    /// The call was attempted and succeeded. The circuit is Closed.
    Success(T),

    /// The call was attempted and failed; the failure has been counted.
    Failed(E),

    /// The breaker short-circuited the call. The executor was not invoked.
    Rejected(RejectReason),
}

impl<T, E> CallOutcome<T, E> {
    /// True for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    /// True for `Rejected` (the upstream was never contacted).
    pub fn is_rejected(&self) -> bool {
        matches!(self, CallOutcome::Rejected(_))
    }
}

/// Why the breaker declined to attempt a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// The circuit is Open and the cooldown has not elapsed.
    #[error("circuit open, retry in {retry_in:?}")]
    CooldownActive {
        /// Time remaining until a probe will be permitted.
        retry_in: Duration,
    },

    /// The circuit is Half-Open and another caller's probe is in flight.
    #[error("recovery probe already in flight")]
    ProbeInFlight,
}
