//! Domain types for the code gate: access codes, epochs, audit entries,
//! and issued sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;

/// Fixed-width numeric one-time code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCode(String);

impl AccessCode {
    pub fn new(code: String) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-short-circuiting comparison against a presented code, to avoid
    /// leaking the match position through timing.
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

/// The current access code together with its issuance time and validity
/// window. Immutable: rotation replaces the whole epoch, never a field.
#[derive(Debug, Clone)]
pub struct CodeEpoch {
    pub code: AccessCode,
    pub issued_at: DateTime<Utc>,
    issued_instant: Instant,
    pub validity: Duration,
}

impl CodeEpoch {
    pub fn new(code: AccessCode, validity: Duration) -> Self {
        Self {
            code,
            issued_at: Utc::now(),
            issued_instant: Instant::now(),
            validity,
        }
    }

    /// Remaining validity, floored at zero. Monotonic-clock based, so wall
    /// clock adjustments cannot resurrect a lapsed code.
    pub fn time_remaining(&self) -> Duration {
        self.validity.saturating_sub(self.issued_instant.elapsed())
    }

    pub fn is_valid(&self) -> bool {
        self.issued_instant.elapsed() < self.validity
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at
            + chrono::Duration::from_std(self.validity).unwrap_or_else(|_| chrono::Duration::zero())
    }
}

/// Which decision point produced an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    IdentityCheck,
    CodeVerify,
}

/// Terminal outcome of a decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessOutcome {
    Authorized,
    Granted,
    NotAuthorized,
    CodeExpired,
    CodeMismatch,
}

/// Why a verification attempt was denied. Responses disclose only this
/// category, never the expected identity set or the current code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthorized,
    CodeExpired,
    CodeMismatch,
}

impl DenyReason {
    pub const fn as_code(self) -> &'static str {
        match self {
            DenyReason::NotAuthorized => "NOT_AUTHORIZED",
            DenyReason::CodeExpired => "CODE_EXPIRED",
            DenyReason::CodeMismatch => "CODE_MISMATCH",
        }
    }

    pub const fn outcome(self) -> AccessOutcome {
        match self {
            DenyReason::NotAuthorized => AccessOutcome::NotAuthorized,
            DenyReason::CodeExpired => AccessOutcome::CodeExpired,
            DenyReason::CodeMismatch => AccessOutcome::CodeMismatch,
        }
    }
}

/// Immutable audit record. Created on every authorization decision and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AccessAction,
    pub identity: String,
    pub outcome: AccessOutcome,
    pub context: String,
}

impl AccessLogEntry {
    pub fn new(
        action: AccessAction,
        identity: impl Into<String>,
        outcome: AccessOutcome,
        context: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            identity: identity.into(),
            outcome,
            context: context.into(),
        }
    }
}

/// Opaque bearer credential minted on successful verification. No
/// server-side store; the caller enforces any expiry or revocation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Session {
    pub token: String,
    pub identity: String,
    pub role: String,
    pub permissions: Vec<String>,
}
