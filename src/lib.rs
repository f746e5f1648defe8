//! Circuit-breaking gateway for flaky upstreams.
//!
//! Wraps outbound HTTP calls in a per-endpoint circuit breaker: once an
//! upstream has failed `failure_threshold` times in a row the circuit opens
//! and calls are short-circuited until a cooldown elapses, after which a
//! single probe request tests recovery.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!                  │                 BREAKER GATEWAY                   │
//!                  │                                                   │
//!  GET /fetch/{x}  │  ┌────────┐   ┌──────────┐   ┌────────────────┐  │
//!  ────────────────┼─▶│  http  │──▶│ breaker  │──▶│   executor     │──┼──▶ Upstream
//!                  │  │ server │   │ registry │   │ (HTTP client)  │  │
//!  ◀───────────────┼──│        │◀──│ + guard  │◀──│                │◀─┼───
//!                  │  └────────┘   └──────────┘   └────────────────┘  │
//!                  │                                                   │
//!                  │  ┌─────────────────────────────────────────────┐  │
//!                  │  │  config        observability (tracing)      │  │
//!                  │  └─────────────────────────────────────────────┘  │
//!                  └──────────────────────────────────────────────────┘
//! ```

// Core subsystem
pub mod breaker;
pub mod executor;

// Glue
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod observability;

pub use breaker::{CallOutcome, CircuitBreaker, CircuitGuard, CircuitState, RejectReason};
pub use config::GatewayConfig;
pub use executor::CallExecutor;
pub use http::HttpServer;
