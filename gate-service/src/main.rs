use gate_service::{
    build_router,
    config::{GateConfig, NotifierMode},
    services::{
        spawn_rotation, AccessLog, Allowlist, CodeGenerator, EmailNotifier, NoopNotifier,
        Notifier, RotationClock, SessionIssuer, Verifier,
    },
    AppState,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = GateConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    // Install the Prometheus recorder behind the `metrics` facade
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting code gate service"
    );

    // Allowlist is fixed for the lifetime of the process
    let allowlist = Arc::new(Allowlist::new(&config.allowlist));
    tracing::info!(members = allowlist.len(), "Allowlist initialized");

    // Mint the boot epoch; an entropy failure here aborts startup
    let generator = CodeGenerator::new(config.rotation.code_digits);
    let validity = Duration::from_secs(config.rotation.validity_seconds);
    let clock = Arc::new(RotationClock::new(generator, validity)?);
    tracing::info!(
        digits = generator.digits(),
        validity_seconds = config.rotation.validity_seconds,
        "Rotation clock initialized"
    );

    let notifier: Arc<dyn Notifier> = match config.notifier.mode {
        NotifierMode::Smtp => {
            let smtp = config.notifier.smtp.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "SMTP notifier selected but SMTP settings are missing"
                ))
            })?;
            Arc::new(EmailNotifier::new(smtp)?)
        }
        NotifierMode::Noop => Arc::new(NoopNotifier),
    };

    let access_log = Arc::new(AccessLog::new(config.audit.capacity));
    let issuer = SessionIssuer::new(
        config.session.role.clone(),
        config.session.permissions.clone(),
    );

    let notify_timeout = Duration::from_secs(config.notifier.timeout_seconds);
    let verifier = Verifier::new(
        allowlist.clone(),
        clock.clone(),
        access_log.clone(),
        issuer,
        notifier.clone(),
        notify_timeout,
    );

    // Clock-driven rotation, independent of request traffic
    let rotation_task = spawn_rotation(
        clock.clone(),
        allowlist.clone(),
        notifier,
        Duration::from_secs(config.rotation.interval_seconds),
        notify_timeout,
    );
    tracing::info!(
        interval_seconds = config.rotation.interval_seconds,
        "Rotation task started"
    );

    let state = AppState {
        config: config.clone(),
        allowlist,
        clock,
        access_log,
        verifier,
        metrics: Some(metrics_handle),
    };

    let app = build_router(state).await?;

    let addr = format!("{}:{}", config.common.host, config.common.port);
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    rotation_task.abort();
    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
