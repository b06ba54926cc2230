//! In-memory response cache.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stats_core::{QueryId, SparqlResult};

/// Status of a cache lookup, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Fresh cache hit.
    Hit,
    /// Cache miss, fetched from the endpoint.
    Miss,
    /// Cache skipped on request (forced refresh).
    Bypass,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Bypass => write!(f, "BYPASS"),
        }
    }
}

/// A cached query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    /// Body of the successful fetch.
    pub data: SparqlResult,
    /// When that fetch completed.
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a new entry.
    pub fn new(data: SparqlResult, timestamp: DateTime<Utc>) -> Self {
        Self { data, timestamp }
    }

    /// Age of the entry at `now`. Clock readings before the timestamp count
    /// as zero age.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }

    /// Age of the entry now.
    pub fn age(&self) -> Duration {
        self.age_at(Utc::now())
    }

    /// Check if the entry is younger than `max_age` at `now`.
    pub fn is_fresh_at(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.age_at(now) < max_age
    }

    /// Check if the entry is younger than `max_age` now.
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.is_fresh_at(max_age, Utc::now())
    }
}

/// Process-lifetime cache of the last successful result per query.
///
/// Holds at most one entry per [`QueryId`]. Entries are only ever replaced
/// wholesale by `put`; there is no expiry-driven eviction, staleness is
/// judged by the reader with [`CacheEntry::is_fresh`].
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<QueryId, CacheEntry>>,
}

impl ResponseCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the entry for a query.
    pub fn get(&self, id: QueryId) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Store a fresh result, stamped with the current time.
    pub fn put(&self, id: QueryId, data: SparqlResult) -> CacheEntry {
        self.put_at(id, data, Utc::now())
    }

    /// Store a result stamped with the given fetch completion time.
    pub fn put_at(&self, id: QueryId, data: SparqlResult, timestamp: DateTime<Utc>) -> CacheEntry {
        let entry = CacheEntry::new(data, timestamp);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, entry.clone());
        entry
    }

    /// Freshness predicate: `now - entry.timestamp < max_age`.
    pub fn is_fresh(entry: &CacheEntry, max_age: Duration) -> bool {
        entry.is_fresh(max_age)
    }

    /// Number of cached queries.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of the cached queries, sorted.
    pub fn ids(&self) -> Vec<QueryId> {
        let mut ids: Vec<QueryId> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
