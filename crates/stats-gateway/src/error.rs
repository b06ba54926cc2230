//! Gateway failure taxonomy.

use std::time::Duration;

use stats_observability::FailureKind;

/// Message for a 404 from the endpoint.
pub const MSG_NOT_FOUND: &str = "SPARQL endpoint not found";
/// Message for a 401/403 from the endpoint.
pub const MSG_AUTH_FAILED: &str = "authentication with the SPARQL endpoint failed";
/// Message for any other non-2xx status.
pub const MSG_REQUEST_FAILED: &str = "SPARQL endpoint request failed";

/// Error type for statistics queries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid query ID: {0}")]
    InvalidQuery(String),

    #[error("SPARQL endpoint is misconfigured: {0}")]
    Misconfigured(String),

    #[error("SPARQL query timed out after {0:?}")]
    Timeout(Duration),

    #[error("SPARQL endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("SPARQL endpoint returned {status}")]
    Upstream { status: u16, body: String },

    #[error("Malformed SPARQL response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Counter category for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidQuery(_) => FailureKind::InvalidQuery,
            Self::Misconfigured(_) => FailureKind::Misconfigured,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Unreachable(_) => FailureKind::Unreachable,
            Self::Upstream { .. } => FailureKind::Upstream,
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }

    /// Message safe to show to API callers.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidQuery(_) => "Invalid query ID",
            Self::Misconfigured(_) => "SPARQL endpoint not configured",
            Self::Timeout(_) => "SPARQL query timed out",
            Self::Unreachable(_) => "SPARQL endpoint unreachable",
            Self::Upstream { status: 404, .. } => MSG_NOT_FOUND,
            Self::Upstream {
                status: 401 | 403, ..
            } => MSG_AUTH_FAILED,
            Self::Upstream { .. } => MSG_REQUEST_FAILED,
            Self::MalformedResponse(_) => "Malformed SPARQL response",
        }
    }

    /// Diagnostic detail forwarded to callers, if any.
    ///
    /// Only upstream failures carry details: the endpoint's own response body.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Upstream { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidQuery(_) => 400,
            Self::Upstream { status, .. } if (400..600).contains(status) => *status,
            // A non-error status we still refused (e.g. 3xx) maps to a gateway failure.
            Self::Upstream { .. } => 502,
            Self::Misconfigured(_)
            | Self::Timeout(_)
            | Self::Unreachable(_)
            | Self::MalformedResponse(_) => 500,
        }
    }

    /// Check whether the failure happened before any network call.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::InvalidQuery(_) | Self::Misconfigured(_))
    }
}
