//! Cached, time-boxed execution of catalog queries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stats_cache::{CacheEntry, CacheHeaderPolicy, CacheHeaders, CacheStatus, ResponseCache};
use stats_core::{GatewayConfig, QueryCatalog, QueryId, RequestId, SparqlResult};
use stats_observability::{GatewayMetrics, Logger};

use crate::error::GatewayError;
use crate::timeout::TimeoutConfig;
use crate::transport::{ReqwestTransport, SparqlTransport};

/// Per-call options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Skip the cache and always query the endpoint.
    pub force_refresh: bool,
    /// Correlation id for log entries.
    pub request_id: Option<RequestId>,
}

impl ExecuteOptions {
    /// Options for a forced refresh.
    pub fn refresh() -> Self {
        Self {
            force_refresh: true,
            request_id: None,
        }
    }

    /// Set the force-refresh flag.
    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Attach a request id.
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

/// Result of a successful execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    /// The endpoint's result document.
    pub data: SparqlResult,
    /// When `data` was fetched.
    pub timestamp: DateTime<Utc>,
    /// Whether `data` came from the cache.
    pub served_from_cache: bool,
    /// Cache status to report.
    pub cache_status: CacheStatus,
}

impl QueryOutcome {
    fn from_entry(entry: CacheEntry, cache_status: CacheStatus) -> Self {
        Self {
            data: entry.data,
            timestamp: entry.timestamp,
            served_from_cache: cache_status == CacheStatus::Hit,
            cache_status,
        }
    }
}

/// Gateway to the archive's SPARQL endpoint.
///
/// Answers fixed catalog queries, serving fresh results from a shared
/// [`ResponseCache`] and otherwise POSTing the query under a deadline.
/// Concurrent cache misses for the same query are coalesced: one caller
/// fetches and the others share its result, failures included. Every call
/// settles within its own deadline. Forced refreshes always fetch.
pub struct SparqlGateway {
    config: GatewayConfig,
    transport: Arc<dyn SparqlTransport>,
    cache: Arc<ResponseCache>,
    metrics: Arc<GatewayMetrics>,
    logger: Logger,
    timeouts: TimeoutConfig,
    cache_ttl: Duration,
    header_policy: CacheHeaderPolicy,
    inflight: Mutex<HashMap<QueryId, Arc<FlightSender>>>,
}

type FlightResult = Option<Result<QueryOutcome, GatewayError>>;
type FlightSender = watch::Sender<FlightResult>;

enum Flight<'a> {
    Leader(FlightGuard<'a>),
    Waiter(watch::Receiver<FlightResult>),
}

/// Held by the caller fetching for a query. Dropping it without settling
/// closes the flight and lets waiters retry.
struct FlightGuard<'a> {
    inflight: &'a Mutex<HashMap<QueryId, Arc<FlightSender>>>,
    id: QueryId,
    sender: Arc<FlightSender>,
}

impl FlightGuard<'_> {
    fn settle(self, result: &Result<QueryOutcome, GatewayError>) {
        self.sender.send_replace(Some(result.clone()));
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if inflight
            .get(&self.id)
            .is_some_and(|current| Arc::ptr_eq(current, &self.sender))
        {
            inflight.remove(&self.id);
        }
    }
}

async fn settled(mut rx: watch::Receiver<FlightResult>) -> FlightResult {
    rx.wait_for(Option::is_some)
        .await
        .ok()
        .and_then(|value| value.clone())
}

impl SparqlGateway {
    /// Create a gateway over an arbitrary transport.
    pub fn new(config: GatewayConfig, transport: Arc<dyn SparqlTransport>) -> Self {
        let cache_ttl = config.cache_ttl();
        Self {
            timeouts: TimeoutConfig::from_config(&config),
            logger: Logger::new(config.environment),
            header_policy: CacheHeaderPolicy::new(cache_ttl),
            cache_ttl,
            config,
            transport,
            cache: Arc::new(ResponseCache::new()),
            metrics: Arc::new(GatewayMetrics::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Create a gateway that talks HTTP via `reqwest`.
    pub fn from_config(config: GatewayConfig) -> Result<Self, GatewayError> {
        let transport = ReqwestTransport::new(TimeoutConfig::from_config(&config))
            .map_err(|e| GatewayError::Misconfigured(e.to_string()))?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Use a shared cache.
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Use shared counters.
    pub fn with_metrics(mut self, metrics: Arc<GatewayMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Use a specific logger.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Override the request timeouts.
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Override the cache TTL (and the advertised max-age).
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self.header_policy = CacheHeaderPolicy::new(ttl);
        self
    }

    /// The configuration the gateway was built with.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The response cache.
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// The counters.
    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.metrics
    }

    /// The logger.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The effective cache TTL.
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Cache headers for a successful outcome.
    pub fn cache_headers(&self, outcome: &QueryOutcome) -> CacheHeaders {
        self.header_policy
            .annotate(outcome.timestamp, outcome.cache_status)
    }

    /// Run the query named by the wire token `id`.
    pub async fn execute(
        &self,
        id: &str,
        options: ExecuteOptions,
    ) -> Result<QueryOutcome, GatewayError> {
        let logger = self.request_logger(&options);

        let result = match id.parse::<QueryId>() {
            Ok(query_id) => self.run(query_id, options.force_refresh, &logger).await,
            Err(_) => Err(GatewayError::InvalidQuery(id.to_string())),
        };

        if let Err(err) = &result {
            self.metrics.record_failure(err.kind());
            logger.error_with(
                "statistics query failed",
                &[("query_id", &id), ("kind", &err.kind().as_str()), ("error", err)],
            );
        }

        result
    }

    /// Run a query by id.
    pub async fn execute_query(
        &self,
        id: QueryId,
        options: ExecuteOptions,
    ) -> Result<QueryOutcome, GatewayError> {
        self.execute(id.as_str(), options).await
    }

    fn request_logger(&self, options: &ExecuteOptions) -> Logger {
        match &options.request_id {
            Some(request_id) => self.logger.for_request(request_id.clone()),
            None => self.logger.clone(),
        }
    }

    async fn run(
        &self,
        id: QueryId,
        force_refresh: bool,
        logger: &Logger,
    ) -> Result<QueryOutcome, GatewayError> {
        let endpoint = self.config.endpoint().ok_or_else(|| {
            GatewayError::Misconfigured("SPARQL_ENDPOINT is not set".to_string())
        })?;
        let deadline = tokio::time::Instant::now() + self.timeouts.total;

        if force_refresh {
            self.metrics.record_forced_refresh();
            logger.info_with("cache bypassed", &[("query_id", &id)]);
            return self
                .fetch(id, endpoint, CacheStatus::Bypass, deadline, logger)
                .await;
        }

        loop {
            if let Some(outcome) = self.cached(id, logger) {
                return Ok(outcome);
            }

            match self.join_flight(id) {
                Flight::Leader(guard) => {
                    self.metrics.record_miss();
                    let result = self
                        .fetch(id, endpoint, CacheStatus::Miss, deadline, logger)
                        .await;
                    guard.settle(&result);
                    return result;
                }
                Flight::Waiter(rx) => {
                    match tokio::time::timeout_at(deadline, settled(rx)).await {
                        Err(_) => return Err(GatewayError::Timeout(self.timeouts.total)),
                        Ok(Some(result)) => {
                            return result.map(|outcome| self.shared(id, outcome, logger));
                        }
                        // The fetching caller went away without a result.
                        Ok(None) => continue,
                    }
                }
            }
        }
    }

    fn join_flight(&self, id: QueryId) -> Flight<'_> {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = inflight.get(&id) {
            return Flight::Waiter(sender.subscribe());
        }

        let sender = Arc::new(watch::Sender::new(None));
        inflight.insert(id, Arc::clone(&sender));
        Flight::Leader(FlightGuard {
            inflight: &self.inflight,
            id,
            sender,
        })
    }

    fn shared(&self, id: QueryId, outcome: QueryOutcome, logger: &Logger) -> QueryOutcome {
        self.metrics.record_hit();
        logger.info_with("shared in-flight fetch", &[("query_id", &id)]);
        QueryOutcome {
            served_from_cache: true,
            cache_status: CacheStatus::Hit,
            ..outcome
        }
    }

    fn cached(&self, id: QueryId, logger: &Logger) -> Option<QueryOutcome> {
        let entry = self.cache.get(id)?;
        if !entry.is_fresh(self.cache_ttl) {
            return None;
        }

        self.metrics.record_hit();
        logger.info_with(
            "cache hit",
            &[("query_id", &id), ("age_secs", &entry.age().as_secs())],
        );
        Some(QueryOutcome::from_entry(entry, CacheStatus::Hit))
    }

    async fn fetch(
        &self,
        id: QueryId,
        endpoint: &str,
        status: CacheStatus,
        deadline: tokio::time::Instant,
        logger: &Logger,
    ) -> Result<QueryOutcome, GatewayError> {
        let query = QueryCatalog::resolve(id);
        let started = Instant::now();

        let response =
            tokio::time::timeout_at(deadline, self.transport.post_query(endpoint, query)).await;
        let elapsed = started.elapsed();
        self.metrics.record_fetch(elapsed);

        let response = match response {
            Err(_) => return Err(GatewayError::Timeout(self.timeouts.total)),
            Ok(Err(err)) => return Err(GatewayError::Unreachable(err.to_string())),
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            return Err(GatewayError::Upstream {
                status: response.status,
                body: response.text(),
            });
        }

        let data = SparqlResult::from_slice(&response.body)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        let rows = data.len();
        let entry = self.cache.put(id, data);

        logger
            .info_builder("fetched from endpoint")
            .field("query_id", id.as_str())
            .field("cache_status", status.to_string())
            .field_u64("rows", rows as u64)
            .duration_ms("elapsed_ms", elapsed)
            .emit();

        Ok(QueryOutcome::from_entry(entry, status))
    }
}

impl std::fmt::Debug for SparqlGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparqlGateway")
            .field("endpoint", &self.config.endpoint())
            .field("cache_ttl", &self.cache_ttl)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{count_body, MockTransport};
    use crate::transport::{TransportError, TransportResponse};
    use stats_core::Environment;
    use stats_observability::{FailureKind, LogLevel, MemorySink};

    const ENDPOINT: &str = "http://graph.test/sparql";
    const SCENARIO_BODY: &str =
        r#"{"results":{"bindings":[{"count":{"value":"42","type":"literal"}}]}}"#;

    fn make_gateway(transport: Arc<MockTransport>) -> (SparqlGateway, MemorySink) {
        let (logger, sink) = Logger::capture(Environment::Development);
        let gateway = SparqlGateway::new(GatewayConfig::new(ENDPOINT), transport).with_logger(logger);
        (gateway, sink)
    }

    // === Cache Tests ===

    #[tokio::test]
    async fn test_miss_then_hit() {
        let transport = Arc::new(MockTransport::ok(SCENARIO_BODY));
        let (gateway, _) = make_gateway(transport.clone());

        let first = gateway
            .execute("totalArticles", ExecuteOptions::default())
            .await
            .unwrap();
        assert!(!first.served_from_cache);
        assert_eq!(first.cache_status, CacheStatus::Miss);
        assert_eq!(first.data.first_value("count"), Some("42"));

        let second = gateway
            .execute("totalArticles", ExecuteOptions::default())
            .await
            .unwrap();
        assert!(second.served_from_cache);
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(second.data, first.data);
        assert_eq!(second.timestamp, first.timestamp);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_sends_catalog_text() {
        let transport = Arc::new(MockTransport::ok(count_body(7)));
        let (gateway, _) = make_gateway(transport.clone());

        gateway
            .execute_query(QueryId::UniqueAuthors, ExecuteOptions::default())
            .await
            .unwrap();

        assert_eq!(
            transport.queries(),
            vec![QueryCatalog::resolve(QueryId::UniqueAuthors).to_string()]
        );
    }

    #[tokio::test]
    async fn test_force_refresh_always_fetches() {
        let transport = Arc::new(MockTransport::ok(count_body(1)));
        let (gateway, _) = make_gateway(transport.clone());

        gateway.execute("totalPeople", ExecuteOptions::default()).await.unwrap();
        let refreshed = gateway
            .execute("totalPeople", ExecuteOptions::refresh())
            .await
            .unwrap();
        let again = gateway
            .execute("totalPeople", ExecuteOptions::refresh())
            .await
            .unwrap();

        assert!(!refreshed.served_from_cache);
        assert_eq!(refreshed.cache_status, CacheStatus::Bypass);
        assert!(!again.served_from_cache);
        assert_eq!(transport.calls(), 3);
        assert_eq!(gateway.metrics().snapshot().forced_refreshes, 2);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched() {
        let transport = Arc::new(MockTransport::ok(count_body(1)));
        let (gateway, _) = make_gateway(transport.clone());
        let gateway = gateway.with_cache_ttl(Duration::from_secs(60));

        let old = SparqlResult::from_slice(count_body(0).as_bytes()).unwrap();
        gateway.cache().put_at(
            QueryId::TotalArticles,
            old,
            Utc::now() - chrono::TimeDelta::seconds(61),
        );

        let outcome = gateway
            .execute("totalArticles", ExecuteOptions::default())
            .await
            .unwrap();

        assert!(!outcome.served_from_cache);
        assert_eq!(outcome.data.first_value("count"), Some("1"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_queries_are_cached_independently() {
        let transport = Arc::new(MockTransport::ok(count_body(3)));
        let (gateway, _) = make_gateway(transport.clone());

        gateway.execute("uniqueAuthors", ExecuteOptions::default()).await.unwrap();
        let other = gateway
            .execute("uniqueLocations", ExecuteOptions::default())
            .await
            .unwrap();

        assert!(!other.served_from_cache);
        assert_eq!(transport.calls(), 2);
        assert_eq!(gateway.cache().len(), 2);
    }

    // === Failure Tests ===

    #[tokio::test]
    async fn test_invalid_query_makes_no_call() {
        let transport = Arc::new(MockTransport::ok(count_body(1)));
        let (gateway, sink) = make_gateway(transport.clone());

        let err = gateway
            .execute("bogus", ExecuteOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err, GatewayError::InvalidQuery("bogus".to_string()));
        assert_eq!(err.status_code(), 400);
        assert_eq!(transport.calls(), 0);
        assert_eq!(sink.at_level(LogLevel::Error).len(), 1);
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_misconfigured() {
        let transport = Arc::new(MockTransport::ok(count_body(1)));
        let gateway = SparqlGateway::new(GatewayConfig::default(), transport.clone());

        let err = gateway
            .execute("totalArticles", ExecuteOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Misconfigured(_)));
        assert_eq!(transport.calls(), 0);
        assert_eq!(gateway.metrics().failures(FailureKind::Misconfigured), 1);
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out_without_caching() {
        let transport =
            Arc::new(MockTransport::ok(count_body(1)).with_delay(Duration::from_millis(500)));
        let (gateway, _) = make_gateway(transport.clone());
        let gateway = gateway.with_timeouts(TimeoutConfig::from_total(Duration::from_millis(50)));

        let err = gateway
            .execute("dateRange", ExecuteOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err, GatewayError::Timeout(Duration::from_millis(50)));
        assert!(gateway.cache().get(QueryId::DateRange).is_none());
        assert_eq!(gateway.metrics().failures(FailureKind::Timeout), 1);
    }

    #[tokio::test]
    async fn test_not_found_forwards_body() {
        let transport = Arc::new(MockTransport::status(404, "no such dataset"));
        let (gateway, _) = make_gateway(transport);

        let err = gateway
            .execute("topAuthors", ExecuteOptions::default())
            .await
            .unwrap_err();

        assert!(err.user_message().contains("endpoint not found"));
        assert_eq!(err.details(), Some("no such dataset"));
        assert_eq!(err.status_code(), 404);
        assert!(gateway.cache().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_is_unreachable() {
        let transport = Arc::new(MockTransport::failing(TransportError::Connection(
            "connection refused".to_string(),
        )));
        let (gateway, _) = make_gateway(transport);

        let err = gateway
            .execute("topPeople", ExecuteOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Unreachable(ref reason) if reason.contains("refused")));
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_cached() {
        let transport = Arc::new(MockTransport::ok("<html>oops</html>"));
        let (gateway, _) = make_gateway(transport);

        let err = gateway
            .execute("topLocations", ExecuteOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::MalformedResponse(_)));
        assert!(gateway.cache().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_entry() {
        let transport = Arc::new(MockTransport::new({
            let calls = std::sync::atomic::AtomicUsize::new(0);
            move |_| {
                if calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                    Ok(TransportResponse::new(200, count_body(5)))
                } else {
                    Ok(TransportResponse::new(503, "overloaded"))
                }
            }
        }));
        let (gateway, _) = make_gateway(transport);

        let first = gateway.execute("totalArticles", ExecuteOptions::default()).await.unwrap();
        let err = gateway
            .execute("totalArticles", ExecuteOptions::refresh())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 503);

        let entry = gateway.cache().get(QueryId::TotalArticles).unwrap();
        assert_eq!(entry.timestamp, first.timestamp);
        assert_eq!(entry.data.first_value("count"), Some("5"));
    }

    // === Concurrency Tests ===

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_fetch_once() {
        let transport =
            Arc::new(MockTransport::ok(count_body(9)).with_delay(Duration::from_millis(50)));
        let (gateway, _) = make_gateway(transport.clone());
        let gateway = Arc::new(gateway);

        let calls = (0..8).map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway
                    .execute("uniqueLocations", ExecuteOptions::default())
                    .await
            })
        });
        let outcomes: Vec<QueryOutcome> = futures::future::join_all(calls)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(transport.calls(), 1);
        assert_eq!(outcomes.iter().filter(|o| !o.served_from_cache).count(), 1);
        assert!(outcomes.iter().all(|o| o.data == outcomes[0].data));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshes_each_fetch() {
        let transport =
            Arc::new(MockTransport::ok(count_body(9)).with_delay(Duration::from_millis(20)));
        let (gateway, _) = make_gateway(transport.clone());
        let gateway = Arc::new(gateway);

        let calls = (0..4).map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway
                    .execute("totalArticles", ExecuteOptions::refresh())
                    .await
            })
        });
        for joined in futures::future::join_all(calls).await {
            joined.unwrap().unwrap();
        }

        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_share_timeout() {
        let transport =
            Arc::new(MockTransport::ok(count_body(9)).with_delay(Duration::from_millis(500)));
        let (gateway, _) = make_gateway(transport.clone());
        let gateway = Arc::new(
            gateway.with_timeouts(TimeoutConfig::from_total(Duration::from_millis(100))),
        );

        let calls = (0..5).map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                let started = Instant::now();
                let result = gateway
                    .execute("totalArticles", ExecuteOptions::default())
                    .await;
                (result, started.elapsed())
            })
        });
        let settled: Vec<_> = futures::future::join_all(calls)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(transport.calls(), 1);
        for (result, elapsed) in &settled {
            assert!(matches!(result, Err(GatewayError::Timeout(_))));
            assert!(*elapsed < Duration::from_millis(300), "took {:?}", elapsed);
        }
        assert!(gateway.cache().get(QueryId::TotalArticles).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_share_upstream_error() {
        let transport = Arc::new(
            MockTransport::status(503, "down").with_delay(Duration::from_millis(50)),
        );
        let (gateway, _) = make_gateway(transport.clone());
        let gateway = Arc::new(gateway);

        let calls = (0..6).map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway
                    .execute("topLocations", ExecuteOptions::default())
                    .await
            })
        });
        for joined in futures::future::join_all(calls).await {
            assert_eq!(joined.unwrap().unwrap_err().status_code(), 503);
        }

        assert_eq!(transport.calls(), 1);
        assert_eq!(gateway.metrics().snapshot().failures.total(), 6);
    }

    #[tokio::test]
    async fn test_failed_flight_does_not_stick() {
        let transport = Arc::new(MockTransport::status(500, "boom"));
        let (gateway, _) = make_gateway(transport.clone());

        assert!(gateway
            .execute("totalArticles", ExecuteOptions::default())
            .await
            .is_err());
        assert!(gateway
            .execute("totalArticles", ExecuteOptions::default())
            .await
            .is_err());

        assert_eq!(transport.calls(), 2);
    }

    // === Observability Tests ===

    #[tokio::test]
    async fn test_logs_carry_request_id() {
        let transport = Arc::new(MockTransport::ok(count_body(1)));
        let (gateway, sink) = make_gateway(transport);

        gateway
            .execute(
                "totalArticles",
                ExecuteOptions::default().with_request_id(RequestId::from_string("req-7")),
            )
            .await
            .unwrap();

        let entries = sink.at_level(LogLevel::Info);
        assert!(!entries.is_empty());
        assert!(entries
            .iter()
            .all(|entry| entry.request_id.as_deref() == Some("req-7")));
    }

    #[tokio::test]
    async fn test_production_logs_only_errors() {
        let transport = Arc::new(MockTransport::status(500, "boom"));
        let (logger, sink) = Logger::capture(Environment::Production);
        let gateway = SparqlGateway::new(GatewayConfig::new(ENDPOINT), transport).with_logger(logger);

        let _ = gateway.execute("totalArticles", ExecuteOptions::default()).await;
        let _ = gateway.execute("nope", ExecuteOptions::default()).await;

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| entry.level == LogLevel::Error));
    }

    #[tokio::test]
    async fn test_metrics_count_hits_and_misses() {
        let transport = Arc::new(MockTransport::ok(count_body(1)));
        let (gateway, _) = make_gateway(transport);

        for _ in 0..3 {
            gateway.execute("totalArticles", ExecuteOptions::default()).await.unwrap();
        }

        let snapshot = gateway.metrics().snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 2);
        assert_eq!(snapshot.fetches, 1);
    }

    #[tokio::test]
    async fn test_cache_headers_for_outcome() {
        let transport = Arc::new(MockTransport::ok(count_body(1)));
        let (gateway, _) = make_gateway(transport);

        let outcome = gateway.execute("totalArticles", ExecuteOptions::default()).await.unwrap();
        let headers = gateway.cache_headers(&outcome);

        assert_eq!(headers.cache_control(), Some("public, max-age=3600"));
        assert_eq!(headers.age(), Some(0));
        assert_eq!(headers.status(), Some(CacheStatus::Miss));
    }
}
