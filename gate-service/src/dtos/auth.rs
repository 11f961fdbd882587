use crate::models::AccessLogEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckIdentityRequest {
    #[validate(length(min = 1, message = "Identity is required"))]
    #[schema(example = "analyst@example.com")]
    pub identity: String,
}

/// Remaining validity of the current code, broken down for display.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExpiresIn {
    #[schema(example = 59)]
    pub minutes: u64,
    #[schema(example = 30)]
    pub seconds: u64,
    #[schema(example = 250)]
    pub ms: u64,
}

impl From<Duration> for ExpiresIn {
    fn from(remaining: Duration) -> Self {
        let total_seconds = remaining.as_secs();
        Self {
            minutes: total_seconds / 60,
            seconds: total_seconds % 60,
            ms: u64::from(remaining.subsec_millis()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckIdentityResponse {
    pub authorized: bool,
    pub expires_in: ExpiresIn,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckIdentityDenied {
    pub authorized: bool,
    #[schema(example = "NOT_AUTHORIZED")]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    #[validate(length(min = 1, message = "Identity is required"))]
    #[schema(example = "analyst@example.com")]
    pub identity: String,

    #[validate(length(min = 1, message = "Code is required"))]
    #[schema(example = "482913")]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub identity: String,
    pub role: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeniedResponse {
    #[schema(example = "CODE_MISMATCH")]
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    pub entries: Vec<AccessLogEntry>,
    pub expires_at: DateTime<Utc>,
    pub allowlist_size: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub code_valid: bool,
    pub time_remaining: ExpiresIn,
    pub allowlist: Vec<String>,
    pub total_log_count: u64,
}
