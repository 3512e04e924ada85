//! One alert invocation: fetch, aggregate, evaluate, compose, notify

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;

use super::composer::{compose, Report};
use super::notifier::{Notifier, NotifierError};
use super::policy::{PolicyReport, ThresholdPolicy};
use crate::data::{BalanceAggregator, BalanceOverflowError, MalformedBalanceError};
use crate::source::{AccountSource, SourceError};

/// Result of a successful invocation
#[derive(Debug)]
pub struct DispatchOutcome {
    pub report: Report,
    pub verdicts: PolicyReport,
    /// Failed deliveries, keyed by notifier name
    pub notification_errors: Vec<(String, NotifierError)>,
}

/// Runs the alert pipeline against an account source
pub struct AlertDispatcher {
    source: Arc<dyn AccountSource>,
    policy: ThresholdPolicy,
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl AlertDispatcher {
    pub fn new(
        source: Arc<dyn AccountSource>,
        policy: ThresholdPolicy,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            source,
            policy,
            notifiers,
        }
    }

    /// Run one invocation.
    ///
    /// Fetch, balance and overflow errors abort with no report. Notifier failures are
    /// logged and returned in the outcome.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<DispatchOutcome, AlertError> {
        let raw = self.source.fetch_accounts().await?;
        let balances = BalanceAggregator::from_accounts(&raw)?;

        tracing::info!(account_count = balances.account_count(), "Evaluating balances");

        let verdicts = self.policy.evaluate(&balances)?;
        let report = compose(&balances, &verdicts, now);

        let notification_errors = match &report.alert {
            Some(alert) => {
                tracing::warn!(
                    credit_liability = %verdicts.credit_liability,
                    aggregate_deficit = %verdicts.aggregate.deficit,
                    primary_deficit = %verdicts.primary.deficit,
                    "Balance alert triggered"
                );
                self.notify(&alert.subject, &alert.body).await
            }
            None => Vec::new(),
        };

        Ok(DispatchOutcome {
            report,
            verdicts,
            notification_errors,
        })
    }

    /// Send to every notifier concurrently and collect failures
    async fn notify(&self, subject: &str, body: &str) -> Vec<(String, NotifierError)> {
        let sends = self.notifiers.iter().map(|notifier| async move {
            let result = notifier.send(subject, body).await;
            (notifier.name().to_string(), result)
        });

        join_all(sends)
            .await
            .into_iter()
            .filter_map(|(name, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    tracing::error!(notifier = %name, error = %e, "Failed to send notification");
                    Some((name, e))
                }
            })
            .collect()
    }
}

/// Errors that abort an invocation
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to fetch accounts: {0}")]
    Fetch(#[from] SourceError),

    #[error(transparent)]
    MalformedBalance(#[from] MalformedBalanceError),

    #[error(transparent)]
    Overflow(#[from] BalanceOverflowError),
}
