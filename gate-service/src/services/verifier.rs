//! The decision core: allowlist gate, expiry check, code comparison,
//! session grant. Every terminal state writes exactly one audit entry.

use crate::models::{AccessAction, AccessLogEntry, AccessOutcome, DenyReason, Session};
use crate::services::{notifier, AccessLog, Allowlist, Notifier, RotationClock, SessionIssuer};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a full verification attempt.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    Granted(Session),
    Denied(DenyReason),
}

/// Outcome of an identity check (code request).
#[derive(Debug, Clone, Copy)]
pub enum IdentityDecision {
    Authorized { time_remaining: Duration },
    Denied,
}

#[derive(Clone)]
pub struct Verifier {
    allowlist: Arc<Allowlist>,
    clock: Arc<RotationClock>,
    access_log: Arc<AccessLog>,
    issuer: SessionIssuer,
    notifier: Arc<dyn Notifier>,
    notify_timeout: Duration,
}

impl Verifier {
    pub fn new(
        allowlist: Arc<Allowlist>,
        clock: Arc<RotationClock>,
        access_log: Arc<AccessLog>,
        issuer: SessionIssuer,
        notifier: Arc<dyn Notifier>,
        notify_timeout: Duration,
    ) -> Self {
        Self {
            allowlist,
            clock,
            access_log,
            issuer,
            notifier,
            notify_timeout,
        }
    }

    /// Gate an identity's request for the current code. When authorized, the
    /// code is dispatched fire-and-forget; the decision never waits on
    /// delivery.
    pub async fn check_identity(&self, identity: &str) -> IdentityDecision {
        let normalized = Allowlist::normalize(identity);

        if !self.allowlist.is_authorized(&normalized) {
            tracing::warn!(identity = %normalized, "Unauthorized identity requested a code");
            self.access_log
                .append(AccessLogEntry::new(
                    AccessAction::IdentityCheck,
                    normalized,
                    AccessOutcome::NotAuthorized,
                    "identity not in allowlist",
                ))
                .await;
            return IdentityDecision::Denied;
        }

        let epoch = self.clock.current_epoch().await;
        notifier::dispatch(
            self.notifier.clone(),
            normalized.clone(),
            epoch.clone(),
            self.notify_timeout,
        );

        self.access_log
            .append(AccessLogEntry::new(
                AccessAction::IdentityCheck,
                normalized,
                AccessOutcome::Authorized,
                "access code dispatched",
            ))
            .await;

        IdentityDecision::Authorized {
            time_remaining: epoch.time_remaining(),
        }
    }

    /// Verify a presented (identity, code) pair. Checks run in strict order
    /// and short-circuit: allowlist, then expiry of the current epoch, then
    /// constant-time code equality. Denials disclose only the reason
    /// category.
    pub async fn verify(&self, identity: &str, presented_code: &str) -> Result<VerifyOutcome, AppError> {
        let normalized = Allowlist::normalize(identity);

        if !self.allowlist.is_authorized(&normalized) {
            tracing::warn!(identity = %normalized, "Unauthorized identity attempted verification");
            self.log_verify(&normalized, DenyReason::NotAuthorized, "identity not in allowlist")
                .await;
            return Ok(VerifyOutcome::Denied(DenyReason::NotAuthorized));
        }

        let epoch = self.clock.current_epoch().await;

        if epoch.time_remaining().is_zero() {
            tracing::info!(identity = %normalized, "Verification against a lapsed code");
            self.log_verify(&normalized, DenyReason::CodeExpired, "current code has expired")
                .await;
            return Ok(VerifyOutcome::Denied(DenyReason::CodeExpired));
        }

        if !epoch.code.matches(presented_code) {
            tracing::info!(identity = %normalized, "Presented code does not match");
            self.log_verify(&normalized, DenyReason::CodeMismatch, "presented code mismatch")
                .await;
            return Ok(VerifyOutcome::Denied(DenyReason::CodeMismatch));
        }

        let session = self.issuer.issue(&normalized)?;

        tracing::info!(identity = %normalized, role = %session.role, "Access granted");
        self.access_log
            .append(AccessLogEntry::new(
                AccessAction::CodeVerify,
                normalized,
                AccessOutcome::Granted,
                "session issued",
            ))
            .await;

        Ok(VerifyOutcome::Granted(session))
    }

    async fn log_verify(&self, identity: &str, reason: DenyReason, context: &str) {
        self.access_log
            .append(AccessLogEntry::new(
                AccessAction::CodeVerify,
                identity,
                reason.outcome(),
                context,
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{CodeGenerator, RecordingNotifier};

    fn verifier_with(validity: Duration) -> (Verifier, Arc<RotationClock>, Arc<AccessLog>) {
        let allowlist = Arc::new(Allowlist::new(&["a@x.com".to_string()]));
        let clock = Arc::new(
            RotationClock::new(CodeGenerator::new(6), validity).expect("clock init failed"),
        );
        let access_log = Arc::new(AccessLog::new(100));
        let issuer = SessionIssuer::new("member".to_string(), vec!["dashboard:read".to_string()]);
        let notifier = Arc::new(RecordingNotifier::default());

        let verifier = Verifier::new(
            allowlist,
            clock.clone(),
            access_log.clone(),
            issuer,
            notifier,
            Duration::from_secs(1),
        );
        (verifier, clock, access_log)
    }

    #[tokio::test]
    async fn unknown_identity_is_denied_regardless_of_code() {
        let (verifier, clock, log) = verifier_with(Duration::from_secs(3600));
        let code = clock.current_epoch().await.code.as_str().to_string();

        let outcome = verifier.verify("b@x.com", &code).await.expect("verify failed");
        assert!(matches!(
            outcome,
            VerifyOutcome::Denied(DenyReason::NotAuthorized)
        ));
        assert_eq!(log.total(), 1);
    }

    #[tokio::test]
    async fn expiry_is_checked_before_code_equality() {
        let (verifier, clock, log) = verifier_with(Duration::ZERO);
        let code = clock.current_epoch().await.code.as_str().to_string();

        // Even the correct current code is refused once the epoch lapses.
        let outcome = verifier.verify("a@x.com", &code).await.expect("verify failed");
        assert!(matches!(
            outcome,
            VerifyOutcome::Denied(DenyReason::CodeExpired)
        ));
        assert_eq!(log.total(), 1);
    }

    #[tokio::test]
    async fn wrong_code_is_a_mismatch() {
        let (verifier, clock, log) = verifier_with(Duration::from_secs(3600));
        let current = clock.current_epoch().await.code.as_str().to_string();
        let wrong = if current == "999999" { "999998" } else { "999999" };

        let outcome = verifier.verify("a@x.com", wrong).await.expect("verify failed");
        assert!(matches!(
            outcome,
            VerifyOutcome::Denied(DenyReason::CodeMismatch)
        ));
        assert_eq!(log.total(), 1);
    }

    #[tokio::test]
    async fn correct_code_grants_a_session() {
        let (verifier, clock, log) = verifier_with(Duration::from_secs(3600));
        let code = clock.current_epoch().await.code.as_str().to_string();

        let outcome = verifier.verify(" A@X.COM ", &code).await.expect("verify failed");
        match outcome {
            VerifyOutcome::Granted(session) => {
                assert_eq!(session.identity, "a@x.com");
                assert_eq!(session.token.len(), 64);
            }
            VerifyOutcome::Denied(reason) => panic!("expected grant, got {reason:?}"),
        }
        assert_eq!(log.total(), 1);
    }

    #[tokio::test]
    async fn rotation_invalidates_the_previous_code() {
        let (verifier, clock, _log) = verifier_with(Duration::from_secs(3600));
        let old_code = clock.current_epoch().await.code.as_str().to_string();

        let new_epoch = clock.rotate().await.expect("rotate failed");

        if new_epoch.code.as_str() == old_code {
            // One-in-900k collision; the old code is then trivially current.
            return;
        }
        let outcome = verifier.verify("a@x.com", &old_code).await.expect("verify failed");
        assert!(matches!(
            outcome,
            VerifyOutcome::Denied(DenyReason::CodeMismatch)
        ));
    }

    #[tokio::test]
    async fn check_identity_appends_exactly_one_entry_each_way() {
        let (verifier, _clock, log) = verifier_with(Duration::from_secs(3600));

        let decision = verifier.check_identity("a@x.com").await;
        assert!(matches!(decision, IdentityDecision::Authorized { .. }));
        assert_eq!(log.total(), 1);

        let decision = verifier.check_identity("b@x.com").await;
        assert!(matches!(decision, IdentityDecision::Denied));
        assert_eq!(log.total(), 2);
    }
}
