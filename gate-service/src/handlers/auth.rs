use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::{
        auth::{
            CheckIdentityDenied, CheckIdentityRequest, CheckIdentityResponse, DeniedResponse,
            SessionResponse, VerifyRequest,
        },
        ErrorResponse,
    },
    models::DenyReason,
    services::{IdentityDecision, VerifyOutcome},
    utils::ValidatedJson,
    AppState,
};

/// Request the current access code for an identity
#[utoipa::path(
    post,
    path = "/auth/check-identity",
    request_body = CheckIdentityRequest,
    responses(
        (status = 200, description = "Identity authorized, code dispatched", body = CheckIdentityResponse),
        (status = 403, description = "Identity not in allowlist", body = CheckIdentityDenied),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Gate"
)]
pub async fn check_identity(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CheckIdentityRequest>,
) -> Result<impl IntoResponse, AppError> {
    match state.verifier.check_identity(&req.identity).await {
        IdentityDecision::Authorized { time_remaining } => Ok((
            StatusCode::OK,
            Json(CheckIdentityResponse {
                authorized: true,
                expires_in: time_remaining.into(),
            }),
        )
            .into_response()),
        IdentityDecision::Denied => Ok((
            StatusCode::FORBIDDEN,
            Json(CheckIdentityDenied {
                authorized: false,
                reason: DenyReason::NotAuthorized.as_code().to_string(),
            }),
        )
            .into_response()),
    }
}

/// Verify an (identity, code) pair and mint a bearer session
#[utoipa::path(
    post,
    path = "/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Access granted", body = SessionResponse),
        (status = 400, description = "Code expired or mismatched", body = DeniedResponse),
        (status = 403, description = "Identity not in allowlist", body = DeniedResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Gate"
)]
pub async fn verify(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    match state.verifier.verify(&req.identity, &req.code).await? {
        VerifyOutcome::Granted(session) => Ok((
            StatusCode::OK,
            Json(SessionResponse {
                token: session.token,
                identity: session.identity,
                role: session.role,
                permissions: session.permissions,
            }),
        )
            .into_response()),
        VerifyOutcome::Denied(reason) => {
            let status = match reason {
                DenyReason::NotAuthorized => StatusCode::FORBIDDEN,
                DenyReason::CodeExpired | DenyReason::CodeMismatch => StatusCode::BAD_REQUEST,
            };
            Ok((
                status,
                Json(DeniedResponse {
                    reason: reason.as_code().to_string(),
                }),
            )
                .into_response())
        }
    }
}
