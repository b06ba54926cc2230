//! Outbound cache headers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::policy::CachePolicy;
use crate::store::CacheStatus;

/// Header names used on statistics responses.
pub mod header_names {
    /// Standard Cache-Control header.
    pub const CACHE_CONTROL: &str = "Cache-Control";
    /// Standard Age header (seconds since the cached body was fetched).
    pub const AGE: &str = "Age";
    /// Cache status header (HIT, MISS, BYPASS).
    pub const X_CACHE_STATUS: &str = "X-Cache-Status";
    /// Request ID for log correlation.
    pub const X_REQUEST_ID: &str = "X-Request-ID";
}

/// Cache metadata to attach to a response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheHeaders {
    cache_control: Option<String>,
    age: Option<u64>,
    status: Option<CacheStatus>,
}

impl CacheHeaders {
    /// The Cache-Control value, if set.
    pub fn cache_control(&self) -> Option<&str> {
        self.cache_control.as_deref()
    }

    /// The Age value in seconds, if set.
    pub fn age(&self) -> Option<u64> {
        self.age
    }

    /// The cache status marker, if set.
    pub fn status(&self) -> Option<CacheStatus> {
        self.status
    }

    /// Convert to header name/value pairs.
    pub fn to_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();

        if let Some(cc) = &self.cache_control {
            headers.push((header_names::CACHE_CONTROL.to_string(), cc.clone()));
        }

        if let Some(age) = self.age {
            headers.push((header_names::AGE.to_string(), age.to_string()));
        }

        if let Some(status) = self.status {
            headers.push((header_names::X_CACHE_STATUS.to_string(), status.to_string()));
        }

        headers
    }

    /// Write these headers into a response header map, replacing existing
    /// values.
    pub fn apply(&self, map: &mut HeaderMap) {
        for (name, value) in self.to_headers() {
            // Names are static and values are ASCII digits/directives.
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                map.insert(name, value);
            }
        }
    }
}

/// Builder for cache response headers.
#[derive(Debug, Default)]
pub struct CacheHeadersBuilder {
    cache_control: Option<String>,
    age: Option<u64>,
    status: Option<CacheStatus>,
}

impl CacheHeadersBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set Cache-Control header.
    pub fn cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    /// Set Cache-Control from policy.
    pub fn cache_control_from_policy(mut self, policy: &CachePolicy) -> Self {
        self.cache_control = Some(policy.cache_control_header());
        self
    }

    /// Set Age header.
    pub fn age(mut self, seconds: u64) -> Self {
        self.age = Some(seconds);
        self
    }

    /// Set cache status marker.
    pub fn status(mut self, status: CacheStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Build the headers.
    pub fn build(self) -> CacheHeaders {
        CacheHeaders {
            cache_control: self.cache_control,
            age: self.age,
            status: self.status,
        }
    }
}

/// Derives outbound cache metadata from the timestamp of the entry served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaderPolicy {
    policy: CachePolicy,
}

impl CacheHeaderPolicy {
    /// Create a public policy advertising `ttl` as max-age.
    pub fn new(ttl: Duration) -> Self {
        Self {
            policy: CachePolicy::public(ttl),
        }
    }

    /// The underlying cache policy.
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Headers for a successful response whose data was fetched at
    /// `timestamp`, as seen at `now`.
    ///
    /// `Age` is the whole number of seconds since `timestamp`; `max-age` is
    /// the whole number of seconds in the TTL.
    pub fn annotate_at(
        &self,
        timestamp: DateTime<Utc>,
        status: CacheStatus,
        now: DateTime<Utc>,
    ) -> CacheHeaders {
        let age = (now - timestamp).to_std().unwrap_or(Duration::ZERO).as_secs();

        CacheHeadersBuilder::new()
            .cache_control_from_policy(&self.policy)
            .age(age)
            .status(status)
            .build()
    }

    /// Headers for a successful response, as seen now.
    pub fn annotate(&self, timestamp: DateTime<Utc>, status: CacheStatus) -> CacheHeaders {
        self.annotate_at(timestamp, status, Utc::now())
    }

    /// Headers for an error response.
    pub fn no_store() -> CacheHeaders {
        CacheHeadersBuilder::new()
            .cache_control_from_policy(&CachePolicy::none())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_annotate_hit() {
        let policy = CacheHeaderPolicy::new(Duration::from_secs(3600));
        let now = Utc::now();
        let fetched = now - TimeDelta::milliseconds(125_900);

        let headers = policy.annotate_at(fetched, CacheStatus::Hit, now).to_headers();

        assert_eq!(header(&headers, "Cache-Control"), Some("public, max-age=3600"));
        assert_eq!(header(&headers, "Age"), Some("125"));
        assert_eq!(header(&headers, "X-Cache-Status"), Some("HIT"));
    }

    #[test]
    fn test_annotate_fresh_fetch_has_zero_age() {
        let policy = CacheHeaderPolicy::new(Duration::from_secs(60));
        let now = Utc::now();

        let headers = policy.annotate_at(now, CacheStatus::Miss, now);

        assert_eq!(headers.age(), Some(0));
        assert_eq!(headers.status(), Some(CacheStatus::Miss));
    }

    #[test]
    fn test_annotate_future_timestamp_clamps_age() {
        let policy = CacheHeaderPolicy::new(Duration::from_secs(60));
        let now = Utc::now();

        let headers = policy.annotate_at(now + TimeDelta::seconds(3), CacheStatus::Hit, now);

        assert_eq!(headers.age(), Some(0));
    }

    #[test]
    fn test_no_store() {
        let headers = CacheHeaderPolicy::no_store();
        assert_eq!(headers.cache_control(), Some("no-store"));
        assert_eq!(headers.age(), None);
        assert_eq!(headers.to_headers().len(), 1);
    }

    #[test]
    fn test_apply_to_header_map() {
        let policy = CacheHeaderPolicy::new(Duration::from_secs(300));
        let now = Utc::now();
        let mut map = HeaderMap::new();
        map.insert("cache-control", HeaderValue::from_static("no-cache"));

        policy
            .annotate_at(now - TimeDelta::seconds(42), CacheStatus::Hit, now)
            .apply(&mut map);

        assert_eq!(map.get("cache-control").unwrap(), "public, max-age=300");
        assert_eq!(map.get("age").unwrap(), "42");
        assert_eq!(map.get("x-cache-status").unwrap(), "HIT");
    }

    #[test]
    fn test_builder_omits_unset_headers() {
        let headers = CacheHeadersBuilder::new().status(CacheStatus::Bypass).build();
        let pairs = headers.to_headers();
        assert_eq!(pairs, vec![("X-Cache-Status".to_string(), "BYPASS".to_string())]);
    }
}
