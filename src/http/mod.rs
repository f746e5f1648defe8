//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! GET /fetch/{name}
//!     → server.rs (resolve upstream by name)
//!     → breaker registry (breaker for the endpoint key)
//!     → CircuitGuard::call (at most one upstream attempt)
//!     → outcome mapped to 200 / 502 / 503
//!
//! GET /breakers
//!     → registry snapshot as JSON
//! ```

pub mod server;

pub use server::HttpServer;
