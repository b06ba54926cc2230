//! Route handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use stats_cache::{header_names, CacheHeaderPolicy};
use stats_core::RequestId;
use stats_gateway::{Dashboard, ExecuteOptions, GatewayError};
use stats_observability::MetricsSnapshot;

use crate::server::AppState;

/// Query string accepted by the statistics routes.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    refresh: Option<String>,
}

impl RefreshParams {
    /// Only the literal `true` forces a refresh.
    fn force_refresh(&self) -> bool {
        self.refresh.as_deref() == Some("true")
    }
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&GatewayError> for ErrorResponse {
    fn from(err: &GatewayError) -> Self {
        Self {
            error: err.user_message().to_string(),
            details: err.details().map(str::to_string),
        }
    }
}

/// Health body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub endpoint_configured: bool,
    pub cache_entries: usize,
    pub metrics: MetricsSnapshot,
}

/// `GET /api/statistics/{query_id}`
pub async fn fetch_statistic(
    State(state): State<Arc<AppState>>,
    Path(query_id): Path<String>,
    Query(params): Query<RefreshParams>,
    headers: HeaderMap,
) -> Response {
    let request_id = request_id(&headers);
    let options = ExecuteOptions::default()
        .with_force_refresh(params.force_refresh())
        .with_request_id(request_id.clone());

    let mut response = match state.gateway.execute(&query_id, options).await {
        Ok(outcome) => {
            let mut response = Json(outcome.data.as_json()).into_response();
            state
                .gateway
                .cache_headers(&outcome)
                .apply(response.headers_mut());
            response
        }
        Err(err) => error_response(&err),
    };

    set_request_id(&mut response, &request_id);
    response
}

/// `GET /api/statistics`
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RefreshParams>,
    headers: HeaderMap,
) -> Response {
    let request_id = request_id(&headers);
    let dashboard: Dashboard = state
        .loader
        .load(params.force_refresh(), Some(request_id.clone()))
        .await;

    let mut response = Json(dashboard).into_response();
    // Individual metrics may be placeholders; never let a cache keep those.
    CacheHeaderPolicy::no_store().apply(response.headers_mut());
    set_request_id(&mut response, &request_id);
    response
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let gateway = &state.gateway;
    Json(HealthResponse {
        status: "ok".to_string(),
        endpoint_configured: gateway.config().endpoint().is_some(),
        cache_entries: gateway.cache().len(),
        metrics: gateway.metrics().snapshot(),
    })
}

fn error_response(err: &GatewayError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(ErrorResponse::from(err))).into_response();
    CacheHeaderPolicy::no_store().apply(response.headers_mut());
    response
}

fn request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get(header_names::X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(RequestId::from_string)
        .unwrap_or_else(RequestId::generate)
}

fn set_request_id(response: &mut Response, request_id: &RequestId) {
    if let (Ok(name), Ok(value)) = (
        HeaderName::from_bytes(header_names::X_REQUEST_ID.as_bytes()),
        HeaderValue::from_str(request_id.as_str()),
    ) {
        response.headers_mut().insert(name, value);
    }
}
