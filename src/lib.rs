//! Balance Alert: deposit-to-debt monitoring for Lunch Money accounts
//!
//! Each invocation fetches linked account balances, checks that liquid
//! deposits cover outstanding credit-card debt by configurable ratios, and
//! renders an HTML report. When a ratio check fails an alert is sent to the
//! configured notifiers (email, webhook, log).
//!
//! # Features
//!
//! - **Exact arithmetic**: balances are `Decimal`, never floats
//! - **Two checks**: total deposits and a single primary account
//! - **Pluggable delivery**: any [`alerts::Notifier`] implementation
//! - **Fail closed**: fetch or parse errors produce no report
//!
//! # Example
//!
//! ```no_run
//! use balance_alert::alerts::{compose, PolicyConfig, ThresholdPolicy};
//! use balance_alert::data::{Account, BalanceAggregator};
//! use chrono::Utc;
//! use rust_decimal_macros::dec;
//!
//! let balances = BalanceAggregator::new(vec![
//!     Account::new(1, "Visa", "credit", dec!(1000), Utc::now()),
//!     Account::new(2, "Checking", "depository", dec!(3000), Utc::now()),
//! ]);
//!
//! let verdicts = ThresholdPolicy::new(PolicyConfig::new("Checking")).evaluate(&balances)?;
//! let report = compose(&balances, &verdicts, Utc::now());
//! if let Some(alert) = &report.alert {
//!     println!("{}", alert.body);
//! }
//! # Ok::<(), balance_alert::data::BalanceOverflowError>(())
//! ```

pub mod alerts;
pub mod api;
pub mod config;
pub mod data;
pub mod source;

// Re-export commonly used types
pub use alerts::{AlertDispatcher, AlertError, PolicyConfig, ThresholdPolicy};
pub use config::{AppConfig, ConfigError};
pub use data::{Account, BalanceAggregator};
