//! Response cache policies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cache scope determining who can cache the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// Cacheable by CDN and browser (shared cache).
    Public,
    /// No caching.
    #[default]
    None,
}

impl CacheScope {
    /// Get the Cache-Control directive for this scope.
    pub fn cache_control_directive(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::None => "no-store",
        }
    }

    /// Check if this scope allows any caching.
    pub fn allows_caching(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Downstream cache policy for a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Cache scope.
    pub scope: CacheScope,
    /// Time-to-live for cached responses.
    pub ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            scope: CacheScope::None,
            ttl: Duration::ZERO,
        }
    }
}

impl CachePolicy {
    /// Policy for responses that must not be stored (errors).
    pub fn none() -> Self {
        Self::default()
    }

    /// Create a public cache policy.
    pub fn public(ttl: Duration) -> Self {
        Self {
            scope: CacheScope::Public,
            ttl,
        }
    }

    /// `max-age` in whole seconds (sub-second TTLs round down).
    pub fn max_age_secs(&self) -> u64 {
        self.ttl.as_secs()
    }

    /// Generate Cache-Control header value.
    pub fn cache_control_header(&self) -> String {
        if !self.scope.allows_caching() {
            return "no-store".to_string();
        }

        format!(
            "{}, max-age={}",
            self.scope.cache_control_directive(),
            self.max_age_secs()
        )
    }
}
