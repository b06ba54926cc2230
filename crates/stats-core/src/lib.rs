//! Core types for the archive statistics gateway.
//!
//! This crate provides the fundamental types shared by the other crates:
//! - `QueryId` - Closed set of statistics query identifiers
//! - `QueryCatalog` - Static SPARQL text for each query
//! - `SparqlResult` - Validated SPARQL JSON results, passed through verbatim
//! - `GatewayConfig` - Startup configuration for the gateway
//! - `RequestId` - Correlation id for request-scoped logging

mod catalog;
mod config;
mod context;
mod query;
mod result;

pub use catalog::*;
pub use config::*;
pub use context::*;
pub use query::*;
pub use result::*;
