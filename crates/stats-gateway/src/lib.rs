//! SPARQL statistics gateway.
//!
//! This crate provides:
//! - `SparqlGateway` - Cached, time-boxed execution of catalog queries
//! - `GatewayError` - Failure taxonomy with status codes and user messages
//! - `SparqlTransport` - Outbound HTTP seam (`ReqwestTransport` in production)
//! - `TimeoutConfig` - Connect and total deadlines
//! - `StatisticsLoader` - Dashboard loading with per-metric failure

mod dashboard;
mod error;
mod gateway;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
mod timeout;
mod transport;

pub use dashboard::*;
pub use error::*;
pub use gateway::*;
pub use timeout::*;
pub use transport::*;
