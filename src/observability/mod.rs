//! Observability subsystem.
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Log level configurable via RUST_LOG with a sensible default
//! - State transitions logged at info/warn, rejections at debug

pub mod logging;
