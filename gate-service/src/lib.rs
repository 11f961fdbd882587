pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    extract::State,
    middleware::from_fn,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{GateConfig, SwaggerMode};
use crate::services::{AccessLog, Allowlist, RotationClock, Verifier};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::check_identity,
        handlers::auth::verify,
        handlers::audit::logs,
        handlers::audit::status,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::CheckIdentityRequest,
            dtos::auth::CheckIdentityResponse,
            dtos::auth::CheckIdentityDenied,
            dtos::auth::ExpiresIn,
            dtos::auth::VerifyRequest,
            dtos::auth::SessionResponse,
            dtos::auth::DeniedResponse,
            dtos::auth::LogsResponse,
            dtos::auth::StatusResponse,
            models::AccessLogEntry,
            models::AccessAction,
            models::AccessOutcome,
        )
    ),
    tags(
        (name = "Gate", description = "One-time-code request and verification"),
        (name = "Audit", description = "Access decision trail and gate status"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: GateConfig,
    pub allowlist: Arc<Allowlist>,
    pub clock: Arc<RotationClock>,
    pub access_log: Arc<AccessLog>,
    pub verifier: Verifier,
    /// `None` when no Prometheus recorder is installed (tests).
    pub metrics: Option<PrometheusHandle>,
}

/// Service health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    ),
    tag = "Observability"
)]
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    }))
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/auth/check-identity", post(handlers::auth::check_identity))
        .route("/auth/verify", post(handlers::auth::verify))
        .route("/auth/logs", get(handlers::audit::logs))
        .route("/auth/status", get(handlers::audit::status));

    if state.config.swagger.enabled == SwaggerMode::Public {
        router = router
            .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    let router = router
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}
