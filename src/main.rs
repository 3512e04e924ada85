//! Balance Alert Server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - BALANCE_ALERT_HOST: Bind address (default: 0.0.0.0)
//! - BALANCE_ALERT_PORT: Port number (default: 8080)
//! - BALANCE_ALERT_API_KEY: Lunch Money access token (required)
//! - BALANCE_ALERT_API_URL: Lunch Money API base (default: https://dev.lunchmoney.app/v1)
//! - BALANCE_ALERT_HTTP_TIMEOUT_SECS: Account fetch and webhook timeout (default: 30)
//! - BALANCE_ALERT_PRIMARY_ACCOUNT: Display name of the primary depository account (required)
//! - BALANCE_ALERT_TOTAL_RATIO: Required deposits per unit of credit debt (default: 4)
//! - BALANCE_ALERT_PRIMARY_RATIO: Required primary balance per unit of credit debt (default: 2)
//! - BALANCE_ALERT_SMTP_SERVER, _SMTP_PORT (465), _SMTP_USER, _SMTP_PASS, _SMTP_FROM, _SMTP_TO:
//!   email delivery, enabled when the server is set
//! - BALANCE_ALERT_WEBHOOK_URL: JSON webhook delivery
//! - BALANCE_ALERT_LOG_ALERTS: Also log alerts (default: true)
//! - RUST_LOG: Log level (default: info)
//!
//! Each GET or POST to `/` runs one check and returns the HTML report.

use balance_alert::api::run_server;
use balance_alert::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "balance_alert=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!("Balance alert configuration:");
    tracing::info!("  Host: {}:{}", config.server.host, config.server.port);
    tracing::info!("  Account source: {}", config.source.base_url);
    tracing::info!("  Primary account: {}", config.policy.primary_account_name);
    tracing::info!(
        "  Ratios: total {} / primary {}",
        config.policy.total_ratio,
        config.policy.primary_ratio
    );
    for target in &config.targets {
        tracing::info!("  Notify: {}", target.kind());
    }

    run_server(config).await
}
