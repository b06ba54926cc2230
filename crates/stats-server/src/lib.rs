//! HTTP interface for archive statistics.
//!
//! # Routes
//!
//! - `GET /api/statistics/{query_id}?refresh=true` - One statistic, as the raw
//!   SPARQL JSON results document
//! - `GET /api/statistics` - Every statistic, each a value or `unavailable`
//! - `GET /health` - Liveness plus counters and cache size
//!
//! Successful statistic responses carry `Cache-Control`, `Age` and
//! `X-Cache-Status`; error responses carry `Cache-Control: no-store` and a
//! `{ "error": ..., "details": ... }` body.

mod handlers;
mod server;

pub use handlers::{ErrorResponse, HealthResponse};
pub use server::*;
