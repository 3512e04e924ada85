use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::data::{PlaidAccount, PlaidAccounts};

pub const DEFAULT_BASE_URL: &str = "https://dev.lunchmoney.app/v1";

/// Anything that can list linked accounts
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn fetch_accounts(&self) -> Result<Vec<PlaidAccount>, SourceError>;
}

/// Client for the Lunch Money `plaid_accounts` endpoint
#[derive(Debug, Clone)]
pub struct LunchMoneyClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LunchMoneyClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("balance-alert/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn accounts_url(&self) -> String {
        format!("{}/plaid_accounts", self.base_url)
    }
}

#[async_trait]
impl AccountSource for LunchMoneyClient {
    async fn fetch_accounts(&self) -> Result<Vec<PlaidAccount>, SourceError> {
        let url = self.accounts_url();

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: PlaidAccounts = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        tracing::debug!(
            url = %url,
            account_count = payload.plaid_accounts.len(),
            "Fetched linked accounts"
        );

        Ok(payload.plaid_accounts)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Account source returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode account payload: {0}")]
    Decode(String),
}
