//! Timeout configuration for endpoint calls.

use std::time::Duration;

use stats_core::GatewayConfig;

/// Timeout configuration for a SPARQL request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Connection timeout.
    pub connect: Duration,
    /// Total operation timeout. Expiry aborts the in-flight request.
    pub total: Duration,
}

impl TimeoutConfig {
    /// Create a new timeout configuration.
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self { connect, total }
    }

    /// Create from a single total timeout. The connect phase gets a quarter
    /// of the budget.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: total / 4,
            total,
        }
    }

    /// Timeouts from gateway configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            connect: config.connect_timeout(),
            total: config.request_timeout(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}
