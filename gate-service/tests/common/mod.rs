//! Test helpers for gate-service integration tests.
//!
//! Spawns the real router on an ephemeral port with an in-process state,
//! a recording notifier, and no Prometheus recorder.

#![allow(dead_code)]

use gate_service::{
    build_router,
    config::{
        AuditConfig, Environment, GateConfig, NotifierConfig, NotifierMode, RotationConfig,
        SessionConfig, SmtpConfig, SwaggerConfig, SwaggerMode,
    },
    services::{
        AccessLog, Allowlist, CodeGenerator, RecordingNotifier, RotationClock, SessionIssuer,
        Verifier,
    },
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const ALLOWED: &str = "a@x.com";
pub const ALSO_ALLOWED: &str = "b@x.com";

/// Knobs a test can turn; everything else is fixed.
pub struct TestOptions {
    pub validity: Duration,
    pub log_capacity: usize,
    pub log_window: usize,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            validity: Duration::from_secs(3600),
            log_capacity: 500,
            log_window: 50,
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub async fn spawn() -> TestApp {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> TestApp {
        let config = test_config(&options);

        let allowlist = Arc::new(Allowlist::new(&config.allowlist));
        let clock = Arc::new(
            RotationClock::new(CodeGenerator::new(config.rotation.code_digits), options.validity)
                .expect("failed to initialize rotation clock"),
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let access_log = Arc::new(AccessLog::new(config.audit.capacity));
        let issuer = SessionIssuer::new(
            config.session.role.clone(),
            config.session.permissions.clone(),
        );
        let verifier = Verifier::new(
            allowlist.clone(),
            clock.clone(),
            access_log.clone(),
            issuer,
            notifier.clone(),
            Duration::from_secs(1),
        );

        let state = AppState {
            config,
            allowlist,
            clock,
            access_log,
            verifier,
            metrics: None,
        };

        let app = build_router(state.clone())
            .await
            .expect("failed to build router");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("failed to read local addr");

        tokio::spawn(async move {
            service_core::axum::serve(listener, app)
                .await
                .expect("test server failed");
        });

        TestApp {
            address: format!("http://{}", addr),
            state,
            notifier,
        }
    }

    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::new()
    }

    pub async fn current_code(&self) -> String {
        self.state
            .clock
            .current_epoch()
            .await
            .code
            .as_str()
            .to_string()
    }

    pub async fn check_identity(&self, identity: &str) -> reqwest::Response {
        self.client()
            .post(format!("{}/auth/check-identity", self.address))
            .json(&serde_json::json!({ "identity": identity }))
            .send()
            .await
            .expect("check-identity request failed")
    }

    pub async fn verify(&self, identity: &str, code: &str) -> reqwest::Response {
        self.client()
            .post(format!("{}/auth/verify", self.address))
            .json(&serde_json::json!({ "identity": identity, "code": code }))
            .send()
            .await
            .expect("verify request failed")
    }

    pub async fn total_log_count(&self) -> u64 {
        self.state.access_log.total()
    }
}

fn test_config(options: &TestOptions) -> GateConfig {
    GateConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        environment: Environment::Dev,
        service_name: "gate-service-test".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "warn".to_string(),
        allowlist: vec![ALLOWED.to_string(), ALSO_ALLOWED.to_string()],
        rotation: RotationConfig {
            interval_seconds: 3600,
            validity_seconds: options.validity.as_secs(),
            code_digits: 6,
        },
        audit: AuditConfig {
            capacity: options.log_capacity,
            window: options.log_window,
        },
        session: SessionConfig {
            role: "member".to_string(),
            permissions: vec!["dashboard:read".to_string(), "commands:execute".to_string()],
        },
        notifier: NotifierConfig {
            mode: NotifierMode::Noop,
            smtp: None::<SmtpConfig>,
            timeout_seconds: 1,
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
    }
}
