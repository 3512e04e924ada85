//! Process configuration, read once from the environment at startup

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::alerts::config::{
    NotifyTarget, PolicyConfig, SmtpSettings, DEFAULT_PRIMARY_RATIO, DEFAULT_TOTAL_RATIO,
};
use crate::api::ServerConfig;
use crate::source::DEFAULT_BASE_URL;

const PREFIX: &str = "BALANCE_ALERT_";

/// Account source connection settings
#[derive(Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Everything the service needs, immutable after startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub policy: PolicyConfig,
    pub targets: Vec<NotifyTarget>,
}

impl AppConfig {
    /// Load from `BALANCE_ALERT_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(format!("{}{}", PREFIX, key)).ok())
    }

    /// Load from an arbitrary key lookup; keys are given without the prefix
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::Missing(env_name(key)));

        let server = ServerConfig {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", 8080)?,
        };

        let source = SourceConfig {
            base_url: get("API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: require("API_KEY")?,
            timeout: Duration::from_secs(parse_or(
                get("HTTP_TIMEOUT_SECS"),
                "HTTP_TIMEOUT_SECS",
                30,
            )?),
        };

        let policy = PolicyConfig::new(require("PRIMARY_ACCOUNT")?)
            .with_total_ratio(parse_or(get("TOTAL_RATIO"), "TOTAL_RATIO", DEFAULT_TOTAL_RATIO)?)
            .with_primary_ratio(parse_or(
                get("PRIMARY_RATIO"),
                "PRIMARY_RATIO",
                DEFAULT_PRIMARY_RATIO,
            )?);
        policy.validate()?;

        let mut targets = Vec::new();
        if parse_or(get("LOG_ALERTS"), "LOG_ALERTS", true)? {
            targets.push(NotifyTarget::Log);
        }
        if let Some(server) = get("SMTP_SERVER") {
            targets.push(NotifyTarget::Email(SmtpSettings {
                server,
                // relay() negotiates TLS on connect, which is served on 465
                port: parse_or(get("SMTP_PORT"), "SMTP_PORT", 465)?,
                user: require("SMTP_USER")?,
                pass: require("SMTP_PASS")?,
                from: require("SMTP_FROM")?,
                to: require("SMTP_TO")?,
            }));
        }
        if let Some(url) = get("WEBHOOK_URL") {
            targets.push(NotifyTarget::Webhook {
                url,
                headers: HashMap::new(),
            });
        }

        Ok(Self {
            server,
            source,
            policy,
            targets,
        })
    }
}

fn env_name(key: &str) -> String {
    format!("{}{}", PREFIX, key)
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
            key: env_name(key),
            value: v,
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(String),

    #[error("Invalid value {value:?} for {key}")]
    Invalid { key: String, value: String },

    #[error("Ratio {key} must be positive, got {value}")]
    InvalidRatio { key: String, value: Decimal },
}
