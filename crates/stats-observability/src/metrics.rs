//! Gateway counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Failure categories tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidQuery,
    Misconfigured,
    Timeout,
    Unreachable,
    Upstream,
    MalformedResponse,
}

impl FailureKind {
    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidQuery => "invalid_query",
            Self::Misconfigured => "misconfigured",
            Self::Timeout => "timeout",
            Self::Unreachable => "unreachable",
            Self::Upstream => "upstream",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

/// Process-wide counters for the gateway.
///
/// Counters only ever increase; read them through [`GatewayMetrics::snapshot`].
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    forced_refreshes: AtomicU64,
    fetches: AtomicU64,
    fetch_time_us: AtomicU64,
    invalid_query: AtomicU64,
    misconfigured: AtomicU64,
    timeout: AtomicU64,
    unreachable: AtomicU64,
    upstream: AtomicU64,
    malformed_response: AtomicU64,
}

impl GatewayMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request served from cache.
    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss.
    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that skipped the cache.
    pub fn record_forced_refresh(&self) {
        self.forced_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed endpoint call, successful or not.
    pub fn record_fetch(&self, elapsed: Duration) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.fetch_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record a failed request.
    pub fn record_failure(&self, kind: FailureKind) {
        self.counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    /// Number of endpoint calls so far.
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Failures of one kind so far.
    pub fn failures(&self, kind: FailureKind) -> u64 {
        self.counter(kind).load(Ordering::Relaxed)
    }

    fn counter(&self, kind: FailureKind) -> &AtomicU64 {
        match kind {
            FailureKind::InvalidQuery => &self.invalid_query,
            FailureKind::Misconfigured => &self.misconfigured,
            FailureKind::Timeout => &self.timeout,
            FailureKind::Unreachable => &self.unreachable,
            FailureKind::Upstream => &self.upstream,
            FailureKind::MalformedResponse => &self.malformed_response,
        }
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let fetches = load(&self.fetches);

        MetricsSnapshot {
            cache_hits: load(&self.cache_hits),
            cache_misses: load(&self.cache_misses),
            forced_refreshes: load(&self.forced_refreshes),
            fetches,
            avg_fetch_us: if fetches == 0 {
                0
            } else {
                load(&self.fetch_time_us) / fetches
            },
            failures: FailureCounts {
                invalid_query: load(&self.invalid_query),
                misconfigured: load(&self.misconfigured),
                timeout: load(&self.timeout),
                unreachable: load(&self.unreachable),
                upstream: load(&self.upstream),
                malformed_response: load(&self.malformed_response),
            },
        }
    }
}

/// Serializable view of [`GatewayMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub forced_refreshes: u64,
    pub fetches: u64,
    /// Mean endpoint call duration (microseconds).
    pub avg_fetch_us: u64,
    pub failures: FailureCounts,
}

impl MetricsSnapshot {
    /// Fraction of non-forced lookups served from cache.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}

/// Failure counters by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounts {
    pub invalid_query: u64,
    pub misconfigured: u64,
    pub timeout: u64,
    pub unreachable: u64,
    pub upstream: u64,
    pub malformed_response: u64,
}

impl FailureCounts {
    /// Sum over all kinds.
    pub fn total(&self) -> u64 {
        self.invalid_query
            + self.misconfigured
            + self.timeout
            + self.unreachable
            + self.upstream
            + self.malformed_response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = GatewayMetrics::new();
        metrics.record_miss();
        metrics.record_fetch(Duration::from_micros(300));
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 3);
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.fetches, 1);
        assert_eq!(snapshot.avg_fetch_us, 300);
        assert_eq!(snapshot.hit_ratio(), 0.75);
    }

    #[test]
    fn test_failures_by_kind() {
        let metrics = GatewayMetrics::new();
        metrics.record_failure(FailureKind::Timeout);
        metrics.record_failure(FailureKind::Timeout);
        metrics.record_failure(FailureKind::Upstream);

        assert_eq!(metrics.failures(FailureKind::Timeout), 2);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.failures.upstream, 1);
        assert_eq!(snapshot.failures.total(), 3);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = GatewayMetrics::new().snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
        assert_eq!(snapshot.hit_ratio(), 0.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = GatewayMetrics::new();
        metrics.record_failure(FailureKind::MalformedResponse);
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["failures"]["malformed_response"], 1);
        assert_eq!(json["cache_hits"], 0);
    }
}
