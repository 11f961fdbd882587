use service_core::axum::{extract::State, response::IntoResponse, Json};

use crate::{
    dtos::auth::{LogsResponse, StatusResponse},
    AppState,
};

/// Most recent access decisions
#[utoipa::path(
    get,
    path = "/auth/logs",
    responses(
        (status = 200, description = "Bounded window of recent access log entries", body = LogsResponse)
    ),
    tag = "Audit"
)]
pub async fn logs(State(state): State<AppState>) -> impl IntoResponse {
    let epoch = state.clock.current_epoch().await;
    let entries = state.access_log.recent(state.config.audit.window).await;

    Json(LogsResponse {
        entries,
        expires_at: epoch.expires_at(),
        allowlist_size: state.allowlist.len(),
    })
}

/// Current gate status
#[utoipa::path(
    get,
    path = "/auth/status",
    responses(
        (status = 200, description = "Epoch validity, time remaining, allowlist, log totals", body = StatusResponse)
    ),
    tag = "Audit"
)]
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let epoch = state.clock.current_epoch().await;

    Json(StatusResponse {
        code_valid: epoch.is_valid(),
        time_remaining: epoch.time_remaining().into(),
        allowlist: state.allowlist.members(),
        total_log_count: state.access_log.total(),
    })
}
