//! Circuit breaker subsystem.
//!
//! # Data Flow
//! ```text
//! Guarded call:
//!     → registry.rs (look up breaker for endpoint key)
//!     → state.rs (admit: pass through, probe, or reject)
//!     → executor invokes the upstream (outside the breaker's lock)
//!     → state.rs (settle: apply success/failure to the machine)
//!     → outcome.rs (Success / Failed / Rejected returned to the caller)
//! ```
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast
//! - Half-Open: exactly one probe tests recovery
//!
//! # Design Decisions
//! - Open → Half-Open is decided lazily at call time; no background timer,
//!   so there is no stale timer to invalidate
//! - Single probe in Half-Open (prevents hammering a recovering upstream)
//! - Rejection is a value, not an error: circuits opening is routine
//! - One breaker per endpoint key, not one global breaker

pub mod guard;
pub mod outcome;
pub mod registry;
pub mod state;

pub use guard::CircuitGuard;
pub use outcome::{CallOutcome, RejectReason};
pub use registry::BreakerRegistry;
pub use state::{BreakerStatus, CallPermit, CircuitBreaker, CircuitState};
