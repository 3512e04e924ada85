//! Rendering of balance listings and alert messages

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Write;

use super::policy::{PolicyReport, Verdict};
use crate::data::{AccountStatus, BalanceAggregator};

pub const ALERT_SUBJECT: &str = "Balance alert: deposits below required ratio";

/// Alert ready to hand to a notifier
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub subject: String,
    /// HTML body
    pub body: String,
}

/// Output of one composition pass
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// HTML fragment with the balance summary and the per-category listing
    pub listing: String,
    /// Present only when at least one verdict is in alert
    pub alert: Option<AlertMessage>,
}

impl Report {
    /// Full HTML page: alert first (if any), then the listing
    pub fn render_page(&self) -> String {
        let mut page = String::from("<html><body>\n");
        if let Some(alert) = &self.alert {
            page.push_str(&alert.body);
        }
        page.push_str(&self.listing);
        page.push_str("</body></html>\n");
        page
    }
}

/// Compose the listing and, when needed, the alert message
pub fn compose(balances: &BalanceAggregator, report: &PolicyReport, now: DateTime<Utc>) -> Report {
    Report {
        listing: compose_listing(balances, report, now),
        alert: compose_alert(report),
    }
}

/// Summary lines followed by accounts grouped by category, each group sorted by balance
pub fn compose_listing(
    balances: &BalanceAggregator,
    report: &PolicyReport,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "<p>Credit liability: {}<br>\nDeposit balance: {}<br>\n{} balance: {}</p>",
        format_currency(report.credit_liability),
        format_currency(report.depository_balance),
        escape_html(&report.primary.label),
        format_currency(report.primary.balance),
    );

    out.push_str("<p>Accounts</p>\n<ul>\n");
    for category in balances.categories() {
        let _ = writeln!(out, "<li>{}\n<ul>", escape_html(category));
        for account in balances.sorted_by_balance(category) {
            let institution = if account.institution_name.is_empty() {
                String::new()
            } else {
                format!(" ({})", escape_html(&account.institution_name))
            };
            let status = match account.status {
                AccountStatus::Active => String::new(),
                other => format!(" [{}]", other.as_str()),
            };
            let _ = writeln!(
                out,
                "<li>{}{} with balance {} last updated {} ago{}</li>",
                escape_html(&account.display_name),
                institution,
                format_currency(account.balance),
                format_elapsed(account.balance_last_update, now),
                status,
            );
        }
        out.push_str("</ul>\n</li>\n");
    }
    out.push_str("</ul>\n");

    out
}

/// Alert body with one paragraph per triggered verdict; `None` when nothing triggered
pub fn compose_alert(report: &PolicyReport) -> Option<AlertMessage> {
    if !report.any_alert() {
        return None;
    }

    let mut body = format!(
        "<p>Current credit liability: {}</p>\n",
        format_currency(report.credit_liability)
    );
    for verdict in report.triggered() {
        body.push_str(&alert_paragraph(verdict));
    }

    Some(AlertMessage {
        subject: ALERT_SUBJECT.to_string(),
        body,
    })
}

fn alert_paragraph(verdict: &Verdict) -> String {
    let ratio = verdict
        .current_ratio
        .map(|r| format!(", current ratio {}", format_ratio(r)))
        .unwrap_or_default();

    format!(
        "<p>ALERT: {} is low. Balance {}{}, required ratio {}. Increase by {} to close the gap.</p>\n",
        escape_html(&verdict.label),
        format_currency(verdict.balance),
        ratio,
        format_ratio(verdict.required_ratio),
        format_currency(verdict.deficit),
    )
}

/// `$1,234,567.89`, negatives as `-$12.00`, rounded half-to-even
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{}", sign, grouped, cents)
}

/// Unitless ratio with two decimals
pub fn format_ratio(ratio: Decimal) -> String {
    format!(
        "{:.2}",
        ratio.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
    )
}

/// Compact elapsed time such as `2d 3h 14m`; zero or future timestamps give `0s`
pub fn format_elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total = now.signed_duration_since(since).num_seconds().max(0);
    let parts = [
        (total / 86_400, "d"),
        (total % 86_400 / 3_600, "h"),
        (total % 3_600 / 60, "m"),
        (total % 60, "s"),
    ];

    let rendered: Vec<String> = parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{}{}", n, unit))
        .collect();

    if rendered.is_empty() {
        "0s".to_string()
    } else {
        rendered.join(" ")
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
