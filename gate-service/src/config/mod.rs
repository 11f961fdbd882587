use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub allowlist: Vec<String>,
    pub rotation: RotationConfig,
    pub audit: AuditConfig,
    pub session: SessionConfig,
    pub notifier: NotifierConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Wall-clock rotation interval; rotation runs on this schedule
    /// independent of request traffic.
    pub interval_seconds: u64,
    /// Validity window of each epoch. Defaults to the rotation interval.
    pub validity_seconds: u64,
    /// Code width; the generated range excludes leading zeros.
    pub code_digits: u32,
}

#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Ring buffer capacity; the oldest entry is evicted past this.
    pub capacity: usize,
    /// Most-recent window returned by the logs endpoint.
    pub window: usize,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub role: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub mode: NotifierMode,
    pub smtp: Option<SmtpConfig>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotifierMode {
    Smtp,
    Noop,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub relay: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    /// Transport-level send timeout, distinct from the dispatch timeout
    /// around the whole notification.
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub enabled: SwaggerMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwaggerMode {
    Public,
    Disabled,
}

impl GateConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let interval_seconds: u64 = get_env("GATE_ROTATION_INTERVAL_SECONDS", Some("3600"), is_prod)?
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                AppError::ConfigError(anyhow::anyhow!(e.to_string()))
            })?;

        let validity_seconds: u64 = match env::var("GATE_CODE_VALIDITY_SECONDS") {
            Ok(val) => val.parse().map_err(|e: std::num::ParseIntError| {
                AppError::ConfigError(anyhow::anyhow!(e.to_string()))
            })?,
            Err(_) => interval_seconds,
        };

        let notifier_mode: NotifierMode =
            get_env("GATE_NOTIFIER", Some("noop"), is_prod)?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let smtp = if notifier_mode == NotifierMode::Smtp {
            Some(SmtpConfig {
                relay: get_env("GATE_SMTP_RELAY", None, is_prod)?,
                user: get_env("GATE_SMTP_USER", None, is_prod)?,
                password: get_env("GATE_SMTP_PASSWORD", None, is_prod)?,
                port: get_env("GATE_SMTP_PORT", Some("587"), is_prod)?
                    .parse()
                    .unwrap_or(587),
                timeout_seconds: get_env("GATE_SMTP_TIMEOUT_SECONDS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
            })
        } else {
            None
        };

        let config = GateConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("gate-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            allowlist: get_env("GATE_ALLOWED_IDENTITIES", None, is_prod)?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            rotation: RotationConfig {
                interval_seconds,
                validity_seconds,
                code_digits: get_env("GATE_CODE_DIGITS", Some("6"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
            },
            audit: AuditConfig {
                capacity: get_env("GATE_LOG_CAPACITY", Some("500"), is_prod)?
                    .parse()
                    .unwrap_or(500),
                window: get_env("GATE_LOG_WINDOW", Some("50"), is_prod)?
                    .parse()
                    .unwrap_or(50),
            },
            session: SessionConfig {
                role: get_env("GATE_SESSION_ROLE", Some("member"), is_prod)?,
                permissions: get_env("GATE_SESSION_PERMISSIONS", Some("dashboard:read"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            notifier: NotifierConfig {
                mode: notifier_mode,
                smtp,
                timeout_seconds: get_env("GATE_NOTIFY_TIMEOUT_SECONDS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
            },
            swagger: SwaggerConfig {
                enabled: get_env("SWAGGER_ENABLED", Some("public"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.allowlist.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GATE_ALLOWED_IDENTITIES must contain at least one identity"
            )));
        }

        if self.rotation.interval_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GATE_ROTATION_INTERVAL_SECONDS must be positive"
            )));
        }

        if !(4..=9).contains(&self.rotation.code_digits) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GATE_CODE_DIGITS must be between 4 and 9"
            )));
        }

        if self.audit.capacity == 0 || self.audit.window == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GATE_LOG_CAPACITY and GATE_LOG_WINDOW must be positive"
            )));
        }

        if self.audit.window > self.audit.capacity {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GATE_LOG_WINDOW cannot exceed GATE_LOG_CAPACITY"
            )));
        }

        if self.environment == Environment::Prod {
            if self.notifier.mode == NotifierMode::Noop {
                tracing::warn!("Noop notifier configured in production - codes will not be delivered");
            }

            if self.swagger.enabled == SwaggerMode::Public {
                tracing::error!("Swagger is publicly accessible in production - consider 'disabled'");
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for NotifierMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "smtp" => Ok(NotifierMode::Smtp),
            "noop" => Ok(NotifierMode::Noop),
            _ => Err(format!("Invalid notifier mode: {}", s)),
        }
    }
}

impl std::str::FromStr for SwaggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(SwaggerMode::Public),
            "disabled" => Ok(SwaggerMode::Disabled),
            _ => Err(format!("Invalid swagger mode: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GateConfig {
        GateConfig {
            common: core_config::Config {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            environment: Environment::Dev,
            service_name: "gate-service".to_string(),
            service_version: "0.0.0".to_string(),
            log_level: "info".to_string(),
            allowlist: vec!["a@x.com".to_string()],
            rotation: RotationConfig {
                interval_seconds: 3600,
                validity_seconds: 3600,
                code_digits: 6,
            },
            audit: AuditConfig {
                capacity: 500,
                window: 50,
            },
            session: SessionConfig {
                role: "member".to_string(),
                permissions: vec!["dashboard:read".to_string()],
            },
            notifier: NotifierConfig {
                mode: NotifierMode::Noop,
                smtp: None,
                timeout_seconds: 10,
            },
            swagger: SwaggerConfig {
                enabled: SwaggerMode::Disabled,
            },
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn empty_allowlist_is_rejected() {
        let mut config = valid_config();
        config.allowlist.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn code_width_is_bounded() {
        let mut config = valid_config();
        config.rotation.code_digits = 3;
        assert!(config.validate().is_err());
        config.rotation.code_digits = 10;
        assert!(config.validate().is_err());
        config.rotation.code_digits = 9;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_rotation_interval_is_rejected() {
        let mut config = valid_config();
        config.rotation.interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn log_window_cannot_exceed_capacity() {
        let mut config = valid_config();
        config.audit.window = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn mode_strings_parse() {
        assert_eq!("SMTP".parse::<NotifierMode>(), Ok(NotifierMode::Smtp));
        assert_eq!("noop".parse::<NotifierMode>(), Ok(NotifierMode::Noop));
        assert!("carrier-pigeon".parse::<NotifierMode>().is_err());
        assert_eq!("Prod".parse::<Environment>(), Ok(Environment::Prod));
        assert!("staging".parse::<Environment>().is_err());
    }
}
