use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::studio::ledger::error::{LedgerError, Result};

/// The three record collections that make up a ledger. Each one is backed by
/// its own workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Clients,
    Revenues,
    Expenses,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Clients => write!(f, "clients"),
            Collection::Revenues => write!(f, "revenues"),
            Collection::Expenses => write!(f, "expenses"),
        }
    }
}

/// Services offered by the studio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Service {
    Makeup,
    LashExtension,
    Eyebrow,
    Other,
}

impl Service {
    pub const ALL: [Service; 4] = [
        Service::Makeup,
        Service::LashExtension,
        Service::Eyebrow,
        Service::Other,
    ];

    /// Label written to the revenues and clients workbooks.
    pub fn label(self) -> &'static str {
        match self {
            Service::Makeup => "Makeup",
            Service::LashExtension => "Lash Extension",
            Service::Eyebrow => "Eyebrow",
            Service::Other => "Other",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Service::Makeup => &["Maquiagem"],
            Service::LashExtension => &["LashExtension", "Extensão de Cílios"],
            Service::Eyebrow => &["Sobrancelha"],
            Service::Other => &["Outro", "Outros"],
        }
    }
}

/// Expense buckets used by the categorical report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Materials,
    Rent,
    Salaries,
    Maintenance,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Materials,
        ExpenseCategory::Rent,
        ExpenseCategory::Salaries,
        ExpenseCategory::Maintenance,
        ExpenseCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Materials => "Materials",
            ExpenseCategory::Rent => "Rent",
            ExpenseCategory::Salaries => "Salaries",
            ExpenseCategory::Maintenance => "Maintenance",
            ExpenseCategory::Other => "Other",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            ExpenseCategory::Materials => &["Material"],
            ExpenseCategory::Rent => &["Aluguel"],
            ExpenseCategory::Salaries => &["Salários", "Salarios"],
            ExpenseCategory::Maintenance => &["Manutenção", "Manutencao"],
            ExpenseCategory::Other => &["Outros", "Outro"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Pix,
    Cash,
    Card,
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Pix,
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Pix => "Pix",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Other => "Other",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            PaymentMethod::Pix => &[],
            PaymentMethod::Cash => &["Dinheiro"],
            PaymentMethod::Card => &["Cartão", "Cartao"],
            PaymentMethod::Other => &["Outro", "Outros"],
        }
    }
}

/// Folds a label for comparison: case and whitespace are not significant.
fn fold_label(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_label<T: Copy>(
    raw: &str,
    candidates: &[T],
    label: impl Fn(T) -> &'static str,
    aliases: impl Fn(T) -> &'static [&'static str],
    kind: &str,
) -> Result<T> {
    let folded = fold_label(raw);
    candidates
        .iter()
        .copied()
        .find(|candidate| {
            fold_label(label(*candidate)) == folded
                || aliases(*candidate)
                    .iter()
                    .any(|alias| fold_label(alias) == folded)
        })
        .ok_or_else(|| LedgerError::Validation(format!("unknown {kind} '{}'", raw.trim())))
}

impl FromStr for Service {
    type Err = LedgerError;

    fn from_str(raw: &str) -> Result<Self> {
        parse_label(raw, &Service::ALL, Service::label, Service::aliases, "service")
    }
}

impl FromStr for ExpenseCategory {
    type Err = LedgerError;

    fn from_str(raw: &str) -> Result<Self> {
        parse_label(
            raw,
            &ExpenseCategory::ALL,
            ExpenseCategory::label,
            ExpenseCategory::aliases,
            "expense category",
        )
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(raw: &str) -> Result<Self> {
        parse_label(
            raw,
            &PaymentMethod::ALL,
            PaymentMethod::label,
            PaymentMethod::aliases,
            "payment method",
        )
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// A roster entry derived from the most recent revenue event for a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Unique key, compared case-sensitively.
    pub name: String,
    pub phone: Option<String>,
    pub last_service_date: Option<NaiveDate>,
    pub last_service: Option<Service>,
}

/// A recorded client service transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueEntry {
    pub date: NaiveDate,
    pub client_name: String,
    pub service: Service,
    pub amount: Decimal,
    pub paid: bool,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
}

/// Everything the operator enters when registering a service. The phone
/// number only feeds the client roster; it is not part of the revenue row.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueSubmission {
    pub date: NaiveDate,
    pub client_name: String,
    pub phone: Option<String>,
    pub service: Service,
    pub amount: Decimal,
    pub paid: bool,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
}

impl RevenueSubmission {
    /// Splits the submission into the revenue row and the phone number.
    pub fn into_entry(self) -> (RevenueEntry, Option<String>) {
        let entry = RevenueEntry {
            date: self.date,
            client_name: self.client_name,
            service: self.service,
            amount: self.amount,
            paid: self.paid,
            payment_method: self.payment_method,
            note: self.note,
        };
        (entry, self.phone)
    }
}

/// Collapses blank optional text to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
