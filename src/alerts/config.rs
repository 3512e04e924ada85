//! Alert policy and notification target configuration

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Category whose balances count as debt
pub const CREDIT_CATEGORY: &str = "credit";
/// Category whose balances count as liquid funds
pub const DEPOSITORY_CATEGORY: &str = "depository";

pub const DEFAULT_TOTAL_RATIO: Decimal = dec!(4);
pub const DEFAULT_PRIMARY_RATIO: Decimal = dec!(2);

/// Ratio thresholds for the deposit checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Display name of the depository account held to `primary_ratio`
    pub primary_account_name: String,
    /// Required depository total per unit of credit debt
    pub total_ratio: Decimal,
    /// Required primary balance per unit of credit debt
    pub primary_ratio: Decimal,
}

impl PolicyConfig {
    /// Create a policy with the default ratios
    pub fn new(primary_account_name: impl Into<String>) -> Self {
        Self {
            primary_account_name: primary_account_name.into(),
            total_ratio: DEFAULT_TOTAL_RATIO,
            primary_ratio: DEFAULT_PRIMARY_RATIO,
        }
    }

    pub fn with_total_ratio(mut self, ratio: Decimal) -> Self {
        self.total_ratio = ratio;
        self
    }

    pub fn with_primary_ratio(mut self, ratio: Decimal) -> Self {
        self.primary_ratio = ratio;
        self
    }

    /// Check that both ratios are strictly positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, ratio) in [
            ("total_ratio", self.total_ratio),
            ("primary_ratio", self.primary_ratio),
        ] {
            if ratio <= Decimal::ZERO {
                return Err(ConfigError::InvalidRatio {
                    key: key.to_string(),
                    value: ratio,
                });
            }
        }
        Ok(())
    }
}

/// SMTP delivery settings
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("pass", &"***")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Notification target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotifyTarget {
    /// Log to tracing
    Log,
    /// HTTP webhook
    Webhook {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
    /// Authenticated SMTP over TLS
    Email(SmtpSettings),
}

impl NotifyTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyTarget::Log => "log",
            NotifyTarget::Webhook { .. } => "webhook",
            NotifyTarget::Email(_) => "email",
        }
    }
}
