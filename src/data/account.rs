//! Linked account records as returned by the ledger API, and their typed form

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Top-level payload of `GET /plaid_accounts`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidAccounts {
    pub plaid_accounts: Vec<PlaidAccount>,
}

/// Synchronization state of a linked account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Account is active and in good state
    Active,
    /// Marked inactive by the user; no balance updates
    Inactive,
    /// Needs to be relinked with Plaid
    Relink,
    /// Awaiting first import of transactions
    Syncing,
    Error,
    #[serde(rename = "not found")]
    NotFound,
    #[serde(rename = "not supported")]
    NotSupported,
    #[serde(other)]
    Unknown,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Relink => "relink",
            AccountStatus::Syncing => "syncing",
            AccountStatus::Error => "error",
            AccountStatus::NotFound => "not found",
            AccountStatus::NotSupported => "not supported",
            AccountStatus::Unknown => "unknown",
        }
    }
}

/// One linked account exactly as the ledger reports it.
///
/// `balance` is kept as the raw text the source sent; it is only turned into
/// an exact decimal when the record is converted into an [`Account`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidAccount {
    pub id: i64,
    pub date_linked: NaiveDate,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub display_name: String,
    #[serde(rename = "type")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subtype: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mask: String,
    pub institution_name: String,
    pub status: AccountStatus,
    #[serde(default)]
    pub limit: Option<Decimal>,
    #[serde(deserialize_with = "raw_amount")]
    pub balance: String,
    pub currency: String,
    pub balance_last_update: DateTime<Utc>,
    #[serde(default)]
    pub import_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_import: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_fetch: Option<DateTime<Utc>>,
    #[serde(default)]
    pub plaid_last_successful_update: Option<DateTime<Utc>>,
}

/// Typed account with an exact balance
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub institution_name: String,
    /// Upstream account type ("credit", "depository", ...)
    pub category: String,
    pub subtype: String,
    pub status: AccountStatus,
    pub currency: String,
    pub balance: Decimal,
    pub balance_last_update: DateTime<Utc>,
}

impl Account {
    /// Build an account directly from typed values
    pub fn new(
        id: i64,
        display_name: impl Into<String>,
        category: impl Into<String>,
        balance: Decimal,
        balance_last_update: DateTime<Utc>,
    ) -> Self {
        let display_name = display_name.into();
        Self {
            id,
            name: display_name.clone(),
            display_name,
            institution_name: String::new(),
            category: category.into(),
            subtype: String::new(),
            status: AccountStatus::Active,
            currency: "usd".to_string(),
            balance,
            balance_last_update,
        }
    }

    pub fn with_institution(mut self, institution_name: impl Into<String>) -> Self {
        self.institution_name = institution_name.into();
        self
    }
}

impl TryFrom<&PlaidAccount> for Account {
    type Error = MalformedBalanceError;

    fn try_from(raw: &PlaidAccount) -> Result<Self, Self::Error> {
        let balance = parse_balance(&raw.balance).ok_or_else(|| MalformedBalanceError {
            account_id: raw.id,
            value: raw.balance.clone(),
        })?;

        let display_name = if raw.display_name.trim().is_empty() {
            raw.name.clone()
        } else {
            raw.display_name.clone()
        };

        Ok(Self {
            id: raw.id,
            name: raw.name.clone(),
            display_name,
            institution_name: raw.institution_name.clone(),
            category: raw.category.clone(),
            subtype: raw.subtype.clone(),
            status: raw.status,
            currency: raw.currency.clone(),
            balance,
            balance_last_update: raw.balance_last_update,
        })
    }
}

/// Parse a balance as an exact decimal, accepting plain and scientific notation
fn parse_balance(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// A balance that could not be read as an exact decimal
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Malformed balance {value:?} on account {account_id}")]
pub struct MalformedBalanceError {
    pub account_id: i64,
    pub value: String,
}

/// Accept a balance sent either as a JSON string or a JSON number, keeping its text
fn raw_amount<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawAmount::deserialize(deserializer)? {
        RawAmount::Text(s) => s,
        RawAmount::Number(n) => n.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
