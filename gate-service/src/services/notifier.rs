//! Code delivery boundary. The gate only needs a success/failure signal;
//! how delivery happens is the implementation's business.

use crate::config::SmtpConfig;
use crate::models::CodeEpoch;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use service_core::axum::async_trait;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, identity: &str, epoch: &CodeEpoch) -> Result<(), AppError>;
}

/// Delivers the current code over SMTP.
#[derive(Clone)]
pub struct EmailNotifier {
    mailer: SmtpTransport,
    from_address: String,
}

impl EmailNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.relay)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)))
            .build();

        tracing::info!(relay = %config.relay, port = config.port, "Email notifier initialized");

        Ok(Self {
            mailer,
            from_address: config.user.clone(),
        })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, identity: &str, epoch: &CodeEpoch) -> Result<(), AppError> {
        let remaining_minutes = epoch.time_remaining().as_secs() / 60;
        let body = format!(
            "Your access code is {}.\n\nIt expires in {} minute(s), at {}. \
             A new code is issued on every rotation; earlier codes stop working immediately.",
            epoch.code.as_str(),
            remaining_minutes,
            epoch.expires_at().format("%Y-%m-%d %H:%M:%S UTC"),
        );

        let email = Message::builder()
            .from(self.from_address.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .to(identity.parse().map_err(
                |e: lettre::address::AddressError| AppError::NotificationFailure(e.to_string()),
            )?)
            .subject("Your access code")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::NotificationFailure(e.to_string()))?;

        // Send in the blocking pool so SMTP latency never stalls the runtime
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(identity = %identity, "Access code email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(identity = %identity, error = %e.to_string(), "Failed to send access code email");
                Err(AppError::NotificationFailure(e.to_string()))
            }
        }
    }
}

/// Dev/test notifier that only traces the delivery.
#[derive(Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, identity: &str, _epoch: &CodeEpoch) -> Result<(), AppError> {
        tracing::debug!(identity = %identity, "Noop notifier: code delivery skipped");
        Ok(())
    }
}

/// Test double that records every delivery it is asked to make.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, identity: &str, epoch: &CodeEpoch) -> Result<(), AppError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((identity.to_string(), epoch.code.as_str().to_string()));
        }
        if self.fail {
            return Err(AppError::NotificationFailure("recording failure".into()));
        }
        Ok(())
    }
}

/// Fire-and-forget dispatch with a bounded timeout. Delivery failure or
/// slowness is logged and never feeds back into the authorization decision.
pub fn dispatch(
    notifier: Arc<dyn Notifier>,
    identity: String,
    epoch: Arc<CodeEpoch>,
    timeout: Duration,
) {
    tokio::spawn(async move {
        match tokio::time::timeout(timeout, notifier.notify(&identity, &epoch)).await {
            Ok(Ok(())) => {
                tracing::info!(identity = %identity, "Access code dispatched");
            }
            Ok(Err(e)) => {
                tracing::warn!(identity = %identity, error = %e, "Access code delivery failed");
            }
            Err(_) => {
                tracing::warn!(identity = %identity, timeout_secs = timeout.as_secs(), "Access code delivery timed out");
            }
        }
    });
}
