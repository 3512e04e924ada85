//! Ratio policy deciding whether deposits cover credit debt

use rust_decimal::Decimal;
use serde::Serialize;

use super::config::{PolicyConfig, CREDIT_CATEGORY, DEPOSITORY_CATEGORY};
use crate::data::{BalanceAggregator, BalanceOverflowError};

/// Outcome of one ratio check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    /// Human-readable name of the monitored quantity
    pub label: String,
    /// Current balance of the monitored quantity
    pub balance: Decimal,
    /// Minimum balance-to-debt ratio
    pub required_ratio: Decimal,
    pub in_alert: bool,
    /// Amount needed to reach the required ratio, never negative
    pub deficit: Decimal,
    /// `balance / debt`, only defined while there is debt
    pub current_ratio: Option<Decimal>,
}

/// Both verdicts plus the inputs they were computed from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyReport {
    /// Aggregate credit debt as a non-negative amount
    pub credit_liability: Decimal,
    pub depository_balance: Decimal,
    /// Total deposits against debt
    pub aggregate: Verdict,
    /// Primary account against debt
    pub primary: Verdict,
}

impl PolicyReport {
    pub fn any_alert(&self) -> bool {
        self.aggregate.in_alert || self.primary.in_alert
    }

    /// Verdicts that are in alert, aggregate first
    pub fn triggered(&self) -> impl Iterator<Item = &Verdict> {
        [&self.aggregate, &self.primary]
            .into_iter()
            .filter(|v| v.in_alert)
    }
}

/// Threshold policy engine
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    config: PolicyConfig,
}

impl ThresholdPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Evaluate both ratio checks against grouped balances.
    ///
    /// Fails only when a sum or required amount exceeds the decimal range.
    pub fn evaluate(
        &self,
        balances: &BalanceAggregator,
    ) -> Result<PolicyReport, BalanceOverflowError> {
        // Credit balances arrive as positive debt; a net overpayment is no debt.
        let credit_balance = -balances.total_balance(CREDIT_CATEGORY)?;
        let credit_liability = (-credit_balance).max(Decimal::ZERO);

        let depository_balance = balances.total_balance(DEPOSITORY_CATEGORY)?;
        let primary_balance = balances
            .find(DEPOSITORY_CATEGORY, &self.config.primary_account_name)
            .map(|a| a.balance)
            .unwrap_or(Decimal::ZERO);

        let aggregate = Self::check(
            "Total deposits",
            depository_balance,
            self.config.total_ratio,
            credit_liability,
        )?;
        let primary = Self::check(
            &format!("Primary account ({})", self.config.primary_account_name),
            primary_balance,
            self.config.primary_ratio,
            credit_liability,
        )?;

        Ok(PolicyReport {
            credit_liability,
            depository_balance,
            aggregate,
            primary,
        })
    }

    /// `deficit = max(0, ratio * debt - balance)`
    fn check(
        label: &str,
        balance: Decimal,
        required_ratio: Decimal,
        debt: Decimal,
    ) -> Result<Verdict, BalanceOverflowError> {
        let deficit = required_ratio
            .checked_mul(debt)
            .and_then(|required| required.checked_sub(balance))
            .ok_or_else(|| BalanceOverflowError(format!("{} requirement", label)))?
            .max(Decimal::ZERO);
        let current_ratio = if debt > Decimal::ZERO {
            balance.checked_div(debt)
        } else {
            None
        };

        Ok(Verdict {
            label: label.to_string(),
            balance,
            required_ratio,
            in_alert: deficit > Decimal::ZERO,
            deficit,
            current_ratio,
        })
    }
}
