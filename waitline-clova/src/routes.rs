//! HTTP routes for the Clova extension endpoint.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use waitline_common::config::{ClovaConfig, HEALTH_PATH, READY_PATH, WAITING_PATH};
use waitline_common::logging::{trace_id_from_headers, TRACE_ID_HEADER};

use crate::error::{ClovaError, ClovaResult};
use crate::interpreter::Interpreter;
use crate::request::CekRequest;
use crate::waiting::{StoreWaiting, WaitingRegistry};

const SERVICE_NAME: &str = "waitline-clova";

// ============================================================================
// State
// ============================================================================

/// Shared state for the Clova HTTP server.
pub struct ClovaState {
    pub interpreter: Interpreter,
    pub config: ClovaConfig,
}

/// Create state with a fresh waiting registry.
pub fn create_state(config: &ClovaConfig) -> Arc<ClovaState> {
    create_state_with_registry(config, Arc::new(WaitingRegistry::new()))
}

/// Create state around an existing registry.
pub fn create_state_with_registry(
    config: &ClovaConfig,
    registry: Arc<WaitingRegistry>,
) -> Arc<ClovaState> {
    Arc::new(ClovaState {
        interpreter: Interpreter::new(config, registry),
        config: config.clone(),
    })
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct WaitingResponse {
    stores: Vec<StoreWaiting>,
}

// ============================================================================
// Health Routes
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn ready(State(state): State<Arc<ClovaState>>) -> impl IntoResponse {
    // Nothing useful can be listed without stores
    if state.interpreter.stores().is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "not_ready",
                service: SERVICE_NAME,
                version: env!("CARGO_PKG_VERSION"),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ready",
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

// ============================================================================
// Clova Webhook
// ============================================================================

async fn clova_webhook(
    State(state): State<Arc<ClovaState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ClovaResult<impl IntoResponse> {
    let trace_id = trace_id_from_headers(&headers);
    let span = tracing::info_span!("cek_request", trace_id = %trace_id);

    let response = span.in_scope(|| {
        let request: CekRequest = serde_json::from_slice(&body)?;
        let response = state.interpreter.handle(&request);
        let response = serde_json::to_value(&response)
            .map_err(|e| ClovaError::Internal(format!("failed to serialize response: {e}")))?;
        tracing::debug!(response = %response, "CEK response");
        Ok::<_, ClovaError>(response)
    })?;

    Ok(([(TRACE_ID_HEADER, trace_id)], Json(response)))
}

// ============================================================================
// Waiting API
// ============================================================================

/// Read-only view of the registry.
async fn list_waiting(State(state): State<Arc<ClovaState>>) -> impl IntoResponse {
    let stores = state
        .interpreter
        .registry()
        .snapshot(state.interpreter.stores());
    Json(WaitingResponse { stores })
}

// ============================================================================
// Router Builder
// ============================================================================

/// Requests running past `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Build the Clova HTTP router.
pub fn build_router(state: Arc<ClovaState>) -> Router {
    let body_limit = state.config.body_limit_bytes;
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let webhook_path = state.config.webhook_path.clone();

    Router::new()
        // Health endpoints
        .route(HEALTH_PATH, get(health))
        .route(READY_PATH, get(ready))
        // Clova extension endpoint
        .route(&webhook_path, post(clova_webhook))
        // Waiting API
        .route(WAITING_PATH, get(list_waiting))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(timeout_layer(timeout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(create_state(&ClovaConfig::default()));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_without_stores() {
        let mut config = ClovaConfig::default();
        config.stores.clear();
        let app = build_router(create_state(&config));

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_custom_webhook_path() {
        let mut config = ClovaConfig::default();
        config.webhook_path = "/extension/waiting".into();
        let app = build_router(create_state(&config));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/extension/waiting")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"request":{"type":"LaunchRequest"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_trace_id_echoed() {
        let app = build_router(create_state(&ClovaConfig::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/clova")
                    .header("content-type", "application/json")
                    .header(TRACE_ID_HEADER, "trace-42")
                    .body(Body::from(r#"{"request":{"type":"LaunchRequest"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[TRACE_ID_HEADER], "trace-42");
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }

        let app = Router::new()
            .route("/slow", get(slow))
            .layer(timeout_layer(Duration::from_millis(10)));

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
