//! Router and listener.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use stats_core::GatewayConfig;
use stats_gateway::{GatewayError, SparqlGateway, StatisticsLoader};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::handlers;

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bind error: {0}")]
    Bind(String),
}

/// State shared by all handlers.
#[derive(Debug)]
pub struct AppState {
    pub gateway: Arc<SparqlGateway>,
    pub loader: StatisticsLoader,
}

impl AppState {
    /// Wrap a gateway.
    pub fn new(gateway: Arc<SparqlGateway>) -> Self {
        Self {
            loader: StatisticsLoader::new(Arc::clone(&gateway)),
            gateway,
        }
    }
}

/// Statistics HTTP server.
#[derive(Debug, Clone)]
pub struct StatsServer {
    state: Arc<AppState>,
}

impl StatsServer {
    /// Create a server over a gateway.
    pub fn new(gateway: Arc<SparqlGateway>) -> Self {
        Self {
            state: Arc::new(AppState::new(gateway)),
        }
    }

    /// Create a server with an HTTP-backed gateway.
    pub fn from_config(config: GatewayConfig) -> Result<Self, ServerError> {
        let gateway = SparqlGateway::from_config(config)?;
        Ok(Self::new(Arc::new(gateway)))
    }

    /// Build the router.
    pub fn router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/statistics", get(handlers::dashboard))
            .route("/api/statistics/{query_id}", get(handlers::fetch_statistic))
            .with_state(state)
    }

    /// Shared state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Run the server on the given address
    pub async fn run(self, addr: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("{}: {}", addr, e)))?;

        let config = self.state.gateway.config();
        tracing::info!(
            addr = addr,
            endpoint = config.endpoint().unwrap_or("<unset>"),
            cache_ttl_secs = self.state.gateway.cache_ttl().as_secs(),
            environment = %config.environment,
            "Statistics server listening"
        );

        axum::serve(listener, Self::router(self.state))
            .await
            .map_err(ServerError::Io)
    }
}
