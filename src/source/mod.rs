//! Account Source: the remote ledger holding linked account balances

pub mod client;

pub use client::{AccountSource, LunchMoneyClient, SourceError, DEFAULT_BASE_URL};
