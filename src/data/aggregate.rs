//! Grouping and summing of account balances by category

use rust_decimal::Decimal;

use super::account::{Account, MalformedBalanceError, PlaidAccount};

/// Accounts grouped by category, in the order each category was first seen
#[derive(Debug, Clone, Default)]
pub struct BalanceAggregator {
    groups: Vec<(String, Vec<Account>)>,
}

impl BalanceAggregator {
    /// Group already-typed accounts
    pub fn new(accounts: Vec<Account>) -> Self {
        let mut groups: Vec<(String, Vec<Account>)> = Vec::new();

        for account in accounts {
            match groups.iter_mut().find(|(c, _)| *c == account.category) {
                Some((_, members)) => members.push(account),
                None => groups.push((account.category.clone(), vec![account])),
            }
        }

        Self { groups }
    }

    /// Convert wire records and group them.
    ///
    /// Fails on the first balance that is not an exact decimal; no accounts
    /// are dropped silently.
    pub fn from_accounts(raw: &[PlaidAccount]) -> Result<Self, MalformedBalanceError> {
        let accounts = raw
            .iter()
            .map(Account::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(accounts))
    }

    /// Category names in first-seen order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(c, _)| c.as_str())
    }

    /// Accounts in a category, empty if the category is absent
    pub fn accounts(&self, category: &str) -> &[Account] {
        self.groups
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, members)| members.as_slice())
            .unwrap_or(&[])
    }

    /// Exact sum of balances in a category; zero when the category is absent
    pub fn total_balance(&self, category: &str) -> Result<Decimal, BalanceOverflowError> {
        self.accounts(category)
            .iter()
            .try_fold(Decimal::ZERO, |total, a| total.checked_add(a.balance))
            .ok_or_else(|| BalanceOverflowError(format!("{} total", category)))
    }

    /// Accounts in a category ordered by ascending balance (stable on ties)
    pub fn sorted_by_balance(&self, category: &str) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self.accounts(category).iter().collect();
        accounts.sort_by(|a, b| a.balance.cmp(&b.balance));
        accounts
    }

    /// First account in a category with the given display name
    pub fn find(&self, category: &str, display_name: &str) -> Option<&Account> {
        self.accounts(category)
            .iter()
            .find(|a| a.display_name == display_name)
    }

    pub fn account_count(&self) -> usize {
        self.groups.iter().map(|(_, members)| members.len()).sum()
    }
}

/// Balance arithmetic left the range of an exact decimal
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Balance arithmetic overflowed computing {0}")]
pub struct BalanceOverflowError(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn account(id: i64, name: &str, category: &str, balance: Decimal) -> Account {
        Account::new(id, name, category, balance, Utc::now())
    }

    fn sample() -> BalanceAggregator {
        BalanceAggregator::new(vec![
            account(1, "Visa", "credit", dec!(250.10)),
            account(2, "Checking", "depository", dec!(1200.00)),
            account(3, "Amex", "credit", dec!(749.90)),
            account(4, "Savings", "depository", dec!(300.00)),
            account(5, "Brokerage", "brokerage", dec!(10000)),
        ])
    }

    #[test]
    fn test_total_balance() {
        let agg = sample();
        assert_eq!(agg.total_balance("credit").unwrap(), dec!(1000.00));
        assert_eq!(agg.total_balance("depository").unwrap(), dec!(1500.00));
        assert_eq!(agg.total_balance("loan").unwrap(), Decimal::ZERO);
        assert_eq!(agg.account_count(), 5);
    }

    #[test]
    fn test_total_balance_is_exact() {
        let agg = BalanceAggregator::new(vec![
            account(1, "A", "depository", dec!(0.1)),
            account(2, "B", "depository", dec!(0.2)),
        ]);
        assert_eq!(agg.total_balance("depository").unwrap(), dec!(0.3));
    }

    #[test]
    fn test_total_balance_overflow() {
        let agg = BalanceAggregator::new(vec![
            account(1, "A", "credit", dec!(50000000000000000000000000000)),
            account(2, "B", "credit", dec!(50000000000000000000000000000)),
            account(3, "C", "depository", dec!(1)),
        ]);
        assert_eq!(
            agg.total_balance("credit"),
            Err(BalanceOverflowError("credit total".to_string()))
        );
        assert_eq!(agg.total_balance("depository").unwrap(), dec!(1));
    }

    #[test]
    fn test_empty_aggregator() {
        let agg = BalanceAggregator::new(vec![]);
        assert_eq!(agg.account_count(), 0);
        assert_eq!(agg.categories().count(), 0);
        assert_eq!(agg.total_balance("credit").unwrap(), Decimal::ZERO);
        assert!(agg.accounts("credit").is_empty());
    }

    #[test]
    fn test_categories_first_seen_order() {
        let agg = sample();
        let categories: Vec<&str> = agg.categories().collect();
        assert_eq!(categories, vec!["credit", "depository", "brokerage"]);
    }

    #[test]
    fn test_sorted_by_balance_is_stable() {
        let agg = BalanceAggregator::new(vec![
            account(1, "High", "depository", dec!(900)),
            account(2, "TieFirst", "depository", dec!(10)),
            account(3, "Negative", "depository", dec!(-5)),
            account(4, "TieSecond", "depository", dec!(10)),
        ]);
        let names: Vec<&str> = agg
            .sorted_by_balance("depository")
            .iter()
            .map(|a| a.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Negative", "TieFirst", "TieSecond", "High"]);
    }

    #[test]
    fn test_find_by_display_name() {
        let agg = sample();
        assert_eq!(agg.find("depository", "Savings").map(|a| a.id), Some(4));
        assert!(agg.find("credit", "Savings").is_none());
    }
}
