//! Balance alerting: ratio policy, report composition and notification
//!
//! The policy and composer are pure; the dispatcher sequences them between
//! the account source and the notifiers.

pub mod composer;
pub mod config;
pub mod dispatcher;
pub mod notifier;
pub mod policy;

pub use composer::{compose, AlertMessage, Report};
pub use config::{NotifyTarget, PolicyConfig, SmtpSettings};
pub use dispatcher::{AlertDispatcher, AlertError, DispatchOutcome};
pub use notifier::{
    build_notifiers, LogNotifier, Notifier, NotifierError, SmtpNotifier, WebhookNotifier,
};
pub use policy::{PolicyReport, ThresholdPolicy, Verdict};
