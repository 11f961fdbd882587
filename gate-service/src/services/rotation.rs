//! Ownership of the current code epoch and the clock-driven rotation task.

use crate::models::CodeEpoch;
use crate::services::{notifier, Allowlist, CodeSource, Notifier};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Single authority for the current `CodeEpoch`. The epoch is replaced as a
/// whole value behind the lock, so concurrent readers can never observe a
/// code paired with a stale timestamp.
pub struct RotationClock {
    source: Box<dyn CodeSource>,
    validity: Duration,
    epoch: RwLock<Arc<CodeEpoch>>,
}

impl RotationClock {
    /// Mints the boot epoch immediately. A generation failure here aborts
    /// startup: the service never runs without a defined current code.
    pub fn new<S>(source: S, validity: Duration) -> Result<Self, AppError>
    where
        S: CodeSource + 'static,
    {
        let epoch = Arc::new(CodeEpoch::new(source.generate()?, validity));

        Ok(Self {
            source: Box::new(source),
            validity,
            epoch: RwLock::new(epoch),
        })
    }

    /// Generate a fresh code and swap it in. The previous epoch is invalid
    /// the moment this returns, regardless of its natural expiry. A
    /// generation failure propagates before the write lock is taken, leaving
    /// the previous epoch in place.
    pub async fn rotate(&self) -> Result<Arc<CodeEpoch>, AppError> {
        let next = Arc::new(CodeEpoch::new(self.source.generate()?, self.validity));

        let mut guard = self.epoch.write().await;
        *guard = next.clone();
        drop(guard);

        Ok(next)
    }

    pub async fn current_epoch(&self) -> Arc<CodeEpoch> {
        self.epoch.read().await.clone()
    }

    /// `validity - elapsed`, floored at zero.
    pub async fn time_remaining(&self) -> Duration {
        self.current_epoch().await.time_remaining()
    }
}

/// Background rotation: tick on the configured interval, rotate, fan the new
/// code out to every allowlisted identity. Rotation is clock-driven, never
/// triggered by request traffic.
pub fn spawn_rotation(
    clock: Arc<RotationClock>,
    allowlist: Arc<Allowlist>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    notify_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The boot epoch was just minted; skip the immediate first tick.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match clock.rotate().await {
                Ok(epoch) => {
                    tracing::info!(expires_at = %epoch.expires_at(), "Access code rotated");
                    for identity in allowlist.members() {
                        notifier::dispatch(
                            notifier.clone(),
                            identity,
                            epoch.clone(),
                            notify_timeout,
                        );
                    }
                }
                Err(e) => {
                    // Surfaced to operators; the lapsed epoch stays in place
                    // and refuses to authenticate rather than being replaced
                    // by an undefined code.
                    tracing::error!(error = %e, "Code rotation failed");
                }
            }
        }
    })
}
