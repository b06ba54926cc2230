//! Scripted transport for tests and offline runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use stats_core::{QueryCatalog, QueryId};

use crate::transport::{SparqlTransport, TransportError, TransportResponse};

type Handler = dyn Fn(&str) -> Result<TransportResponse, TransportError> + Send + Sync;

/// Transport answering from a closure, with an optional delay and a call log.
pub struct MockTransport {
    handler: Box<Handler>,
    delay: Duration,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Answer every query with `handler(query_text)`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Answer by catalog id. Query texts not in the catalog get a 400.
    pub fn by_query<F>(handler: F) -> Self
    where
        F: Fn(QueryId) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        Self::new(move |query| {
            match QueryCatalog::entries().find(|(_, text)| *text == query) {
                Some((id, _)) => handler(id),
                None => Ok(TransportResponse::new(400, "unknown query")),
            }
        })
    }

    /// Always answer 200 with `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move |_| Ok(TransportResponse::new(200, body.clone())))
    }

    /// Always answer with `status` and `body`.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move |_| Ok(TransportResponse::new(status, body.clone())))
    }

    /// Always fail at the network level.
    pub fn failing(error: TransportError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of queries received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Query texts received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("delay", &self.delay)
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SparqlTransport for MockTransport {
    async fn post_query(
        &self,
        _endpoint: &str,
        query: &str,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        (self.handler)(query)
    }
}

/// A SPARQL JSON body with one `count` binding.
pub fn count_body(count: u64) -> String {
    format!(
        r#"{{"head":{{"vars":["count"]}},"results":{{"bindings":[{{"count":{{"type":"literal","datatype":"http://www.w3.org/2001/XMLSchema#integer","value":"{}"}}}}]}}}}"#,
        count
    )
}
