//! Observability infrastructure for the statistics gateway.
//!
//! This crate provides:
//! - `Logger` - Structured logging gated by deployment environment
//! - `MemorySink` - In-memory log capture
//! - `GatewayMetrics` - Cache and fetch counters

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;

// Re-export RequestId from stats-core for convenience
pub use stats_core::RequestId;
