pub mod account;
pub mod aggregate;

pub use account::{Account, AccountStatus, MalformedBalanceError, PlaidAccount, PlaidAccounts};
pub use aggregate::{BalanceAggregator, BalanceOverflowError};
