//! Caching infrastructure for the statistics gateway.
//!
//! This crate provides:
//! - `ResponseCache` - Process-lifetime map from query id to the last good result
//! - `CacheEntry` - A cached result plus its fetch completion time
//! - `CachePolicy` - Cache-Control directive generation
//! - `CacheHeaderPolicy` - `Cache-Control` / `Age` / `X-Cache-Status` for responses
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use stats_cache::{CacheHeaderPolicy, CacheStatus, ResponseCache};
//!
//! let cache = ResponseCache::new();
//! let entry = cache.put(QueryId::TotalArticles, result);
//!
//! let policy = CacheHeaderPolicy::new(Duration::from_secs(3600));
//! let headers = policy.annotate(entry.timestamp, CacheStatus::Miss);
//! ```

mod headers;
mod policy;
mod store;

pub use headers::*;
pub use policy::*;
pub use store::*;
