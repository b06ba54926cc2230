//! Dashboard loading: every catalog query, each failing on its own.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use stats_core::{QueryId, QueryKind, RequestId, SparqlResult};

use crate::error::GatewayError;
use crate::gateway::{ExecuteOptions, QueryOutcome, SparqlGateway};

/// Placeholder shown for a metric whose query failed.
pub const UNAVAILABLE: &str = "unavailable";

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedItem {
    pub name: String,
    pub count: u64,
}

/// A statistic decoded from its result bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Statistic {
    Count { value: u64 },
    Range { earliest: String, latest: String },
    Ranking { items: Vec<RankedItem> },
}

impl Statistic {
    /// Decode `result` according to the shape `kind` produces.
    pub fn decode(kind: QueryKind, result: &SparqlResult) -> Result<Self, String> {
        match kind {
            QueryKind::Count => {
                let value = parse_count(result.first_value("count"))?;
                Ok(Self::Count { value })
            }
            QueryKind::Range => {
                let earliest = result.first_value("earliest").ok_or("missing earliest")?;
                let latest = result.first_value("latest").ok_or("missing latest")?;
                Ok(Self::Range {
                    earliest: earliest.to_string(),
                    latest: latest.to_string(),
                })
            }
            QueryKind::Ranking => {
                let items = result
                    .bindings()
                    .iter()
                    .map(|binding| -> Result<RankedItem, String> {
                        let name = binding.get("name").ok_or("missing name")?;
                        let count = parse_count(binding.get("count").map(|t| t.value.as_str()))?;
                        Ok(RankedItem {
                            name: name.value.clone(),
                            count,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Ranking { items })
            }
        }
    }
}

fn parse_count(value: Option<&str>) -> Result<u64, String> {
    let value = value.ok_or("missing count")?;
    value
        .trim()
        .parse()
        .map_err(|_| format!("count is not a number: '{}'", value))
}

/// A dashboard metric: a decoded value or a placeholder with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MetricValue {
    Available {
        #[serde(flatten)]
        statistic: Statistic,
        served_from_cache: bool,
    },
    Unavailable {
        reason: String,
    },
}

impl MetricValue {
    /// Check if the metric has a value.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    fn from_outcome(kind: QueryKind, outcome: Result<QueryOutcome, GatewayError>) -> Self {
        match outcome {
            Ok(outcome) => match Statistic::decode(kind, &outcome.data) {
                Ok(statistic) => Self::Available {
                    statistic,
                    served_from_cache: outcome.served_from_cache,
                },
                Err(reason) => Self::Unavailable { reason },
            },
            Err(err) => Self::Unavailable {
                reason: err.user_message().to_string(),
            },
        }
    }
}

/// A named dashboard metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardMetric {
    pub query_id: QueryId,
    #[serde(flatten)]
    pub value: MetricValue,
}

/// All dashboard metrics, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub metrics: Vec<DashboardMetric>,
}

impl Dashboard {
    /// Look up a metric.
    pub fn get(&self, id: QueryId) -> Option<&MetricValue> {
        self.metrics
            .iter()
            .find(|metric| metric.query_id == id)
            .map(|metric| &metric.value)
    }

    /// Number of metrics with a value.
    pub fn available(&self) -> usize {
        self.metrics.iter().filter(|m| m.value.is_available()).count()
    }
}

/// Loads every catalog query concurrently through a gateway.
#[derive(Debug, Clone)]
pub struct StatisticsLoader {
    gateway: Arc<SparqlGateway>,
}

impl StatisticsLoader {
    /// Create a loader.
    pub fn new(gateway: Arc<SparqlGateway>) -> Self {
        Self { gateway }
    }

    /// Load all metrics.
    pub async fn load(&self, force_refresh: bool, request_id: Option<RequestId>) -> Dashboard {
        let loads = QueryId::ALL.into_iter().map(|id| {
            let mut options = ExecuteOptions::default().with_force_refresh(force_refresh);
            options.request_id = request_id.clone();
            async move {
                let outcome = self.gateway.execute_query(id, options).await;
                DashboardMetric {
                    query_id: id,
                    value: MetricValue::from_outcome(id.kind(), outcome),
                }
            }
        });

        Dashboard {
            metrics: join_all(loads).await,
        }
    }
}
