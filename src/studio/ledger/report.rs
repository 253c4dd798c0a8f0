//! Monthly and categorical aggregates over the ledger collections.
//!
//! Nothing here mutates or caches; every call recomputes from the slices it
//! is given.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::studio::ledger::dates;
use crate::studio::ledger::error::LedgerError;
use crate::studio::ledger::model::{ExpenseCategory, ExpenseEntry, RevenueEntry};

/// Sentinel month key selecting every row.
pub const ALL_MONTHS: &str = "All";

/// A dated amount that can be bucketed by month.
pub trait Posting {
    fn date(&self) -> NaiveDate;
    fn amount(&self) -> Decimal;
}

impl Posting for RevenueEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

impl Posting for ExpenseEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Which rows a total covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Month {
        year: i32,
        month: u32,
    },
}

impl MonthFilter {
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month { year, month } => date.year() == *year && date.month() == *month,
        }
    }
}

impl FromStr for MonthFilter {
    type Err = LedgerError;

    /// Accepts `All` (or `Todos`) and `MM/YYYY` keys.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(ALL_MONTHS) || trimmed.eq_ignore_ascii_case("Todos") {
            return Ok(MonthFilter::All);
        }
        let (year, month) = dates::parse_month_key(trimmed)?;
        Ok(MonthFilter::Month { year, month })
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str(ALL_MONTHS),
            MonthFilter::Month { year, month } => write!(f, "{month:02}/{year}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total_revenue: Decimal,
    pub total_expense: Decimal,
    pub net_profit: Decimal,
}

impl Totals {
    /// True when expenses exceed revenue for the period.
    pub fn is_loss(&self) -> bool {
        self.net_profit < Decimal::ZERO
    }
}

/// `"All"` followed by every month that has revenue, oldest first.
pub fn available_months(revenues: &[RevenueEntry]) -> Vec<String> {
    let months: BTreeSet<(i32, u32)> = revenues
        .iter()
        .map(|entry| (entry.date.year(), entry.date.month()))
        .collect();

    std::iter::once(ALL_MONTHS.to_string())
        .chain(
            months
                .into_iter()
                .map(|(year, month)| MonthFilter::Month { year, month }.to_string()),
        )
        .collect()
}

/// Revenue, expense and net profit for the rows selected by `filter`.
pub fn totals(
    revenues: &[RevenueEntry],
    expenses: &[ExpenseEntry],
    filter: MonthFilter,
) -> Totals {
    let total_revenue = sum_matching(revenues, filter);
    let total_expense = sum_matching(expenses, filter);
    Totals {
        total_revenue,
        total_expense,
        net_profit: total_revenue - total_expense,
    }
}

/// Expense amount per category. Categories without rows are absent.
pub fn by_category(expenses: &[ExpenseEntry]) -> BTreeMap<ExpenseCategory, Decimal> {
    let mut grouped = BTreeMap::new();
    for entry in expenses {
        *grouped.entry(entry.category).or_insert(Decimal::ZERO) += entry.amount;
    }
    grouped
}

fn sum_matching<P: Posting>(rows: &[P], filter: MonthFilter) -> Decimal {
    rows.iter()
        .filter(|row| filter.matches(row.date()))
        .map(|row| row.amount())
        .sum()
}

/// Two-decimal display with thousands separators, e.g. `R$ 1,234.50`.
pub fn format_currency(amount: Decimal) -> String {
    let rendered = format!("{:.2}", amount.abs().round_dp(2));
    let (whole, cents) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < Decimal::ZERO { "-" } else { "" };
    format!("{sign}R$ {grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::ledger::model::{PaymentMethod, Service};
    use rust_decimal_macros::dec;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn revenue(date: NaiveDate, amount: Decimal) -> RevenueEntry {
        RevenueEntry {
            date,
            client_name: "Ana".into(),
            service: Service::Makeup,
            amount,
            paid: true,
            payment_method: PaymentMethod::Pix,
            note: None,
        }
    }

    fn expense(date: NaiveDate, category: ExpenseCategory, amount: Decimal) -> ExpenseEntry {
        ExpenseEntry {
            date,
            category,
            description: "stock".into(),
            amount,
            payment_method: PaymentMethod::Card,
            note: None,
        }
    }

    #[test]
    fn totals_filter_by_month() {
        let revenues = vec![
            revenue(ymd(2024, 5, 3), dec!(100)),
            revenue(ymd(2024, 6, 20), dec!(50)),
        ];
        let may: MonthFilter = "05/2024".parse().unwrap();

        assert_eq!(totals(&revenues, &[], may).total_revenue, dec!(100));
        assert_eq!(totals(&revenues, &[], MonthFilter::All).total_revenue, dec!(150));
    }

    #[test]
    fn net_profit_may_be_negative() {
        let revenues = vec![revenue(ymd(2024, 5, 3), dec!(100))];
        let expenses = vec![
            expense(ymd(2024, 5, 1), ExpenseCategory::Rent, dec!(900)),
            expense(ymd(2024, 6, 1), ExpenseCategory::Rent, dec!(900)),
        ];

        let may = totals(&revenues, &expenses, "05/2024".parse().unwrap());
        assert_eq!(may.total_expense, dec!(900));
        assert_eq!(may.net_profit, dec!(-800));
        assert!(may.is_loss());

        let june = totals(&revenues, &expenses, "06/2024".parse().unwrap());
        assert_eq!(june.total_revenue, Decimal::ZERO);
    }

    #[test]
    fn available_months_are_unique_and_chronological() {
        let revenues = vec![
            revenue(ymd(2025, 1, 2), dec!(10)),
            revenue(ymd(2024, 5, 27), dec!(10)),
            revenue(ymd(2024, 5, 3), dec!(10)),
            revenue(ymd(2024, 12, 9), dec!(10)),
        ];
        assert_eq!(
            available_months(&revenues),
            vec!["All", "05/2024", "12/2024", "01/2025"]
        );
        assert_eq!(available_months(&[]), vec!["All"]);
    }

    #[test]
    fn category_breakdown_omits_empty_groups() {
        let expenses = vec![
            expense(ymd(2024, 5, 1), ExpenseCategory::Rent, dec!(900)),
            expense(ymd(2024, 6, 1), ExpenseCategory::Rent, dec!(950.50)),
        ];
        let grouped = by_category(&expenses);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.get(&ExpenseCategory::Rent), Some(&dec!(1850.50)));
        assert!(!grouped.contains_key(&ExpenseCategory::Materials));
    }

    #[test]
    fn month_filter_parses_and_displays() {
        assert_eq!("All".parse::<MonthFilter>().unwrap(), MonthFilter::All);
        assert_eq!("Todos".parse::<MonthFilter>().unwrap(), MonthFilter::All);
        let filter: MonthFilter = "07/2024".parse().unwrap();
        assert_eq!(filter, MonthFilter::Month { year: 2024, month: 7 });
        assert_eq!(filter.to_string(), "07/2024");
        assert_eq!(dates::month_key(ymd(2024, 7, 31)), filter.to_string());
        assert!("July".parse::<MonthFilter>().is_err());
    }

    #[test]
    fn currency_display_uses_two_decimals() {
        assert_eq!(format_currency(dec!(0)), "R$ 0.00");
        assert_eq!(format_currency(dec!(1234.5)), "R$ 1,234.50");
        assert_eq!(format_currency(dec!(1234567.891)), "R$ 1,234,567.89");
        assert_eq!(format_currency(dec!(-800)), "-R$ 800.00");
    }
}
