//! Column layout of the three ledger workbooks and the conversions between
//! worksheet rows and model records.
//!
//! Columns are located by header name, so files whose columns were reordered
//! by hand still load. The Portuguese headers of the studio's older
//! spreadsheets are accepted as aliases on read; writes always use the
//! canonical names.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::studio::ledger::dates::{self, DateInput};
use crate::studio::ledger::error::LedgerError;
use crate::studio::ledger::io::{Cell, SheetError, SheetTable};
use crate::studio::ledger::model::{Client, Collection, ExpenseEntry, RevenueEntry};

/// A canonical column plus the legacy headers it may appear under.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

const fn column(name: &'static str, aliases: &'static [&'static str]) -> Column {
    Column { name, aliases }
}

pub const CLIENT_COLUMNS: [Column; 4] = [
    column("Name", &["Nome"]),
    column("Phone", &["Telefone"]),
    column("LastServiceDate", &["Último Atendimento", "Last Service Date"]),
    column("Service", &["Serviço", "LastService"]),
];

pub const REVENUE_COLUMNS: [Column; 7] = [
    column("Date", &["Data"]),
    column("ClientName", &["Cliente", "Client"]),
    column("Service", &["Serviço"]),
    column("Amount", &["Valor"]),
    column("Paid", &["Pago"]),
    column("PaymentMethod", &["Forma de Pagamento", "Payment Method"]),
    column("Note", &["Observação", "Observacao"]),
];

pub const EXPENSE_COLUMNS: [Column; 6] = [
    column("Date", &["Data"]),
    column("Category", &["Categoria"]),
    column("Description", &["Descrição", "Descricao"]),
    column("Amount", &["Valor"]),
    column("PaymentMethod", &["Forma de Pagamento", "Payment Method"]),
    column("Note", &["Observação", "Observacao"]),
];

pub fn columns(collection: Collection) -> &'static [Column] {
    match collection {
        Collection::Clients => &CLIENT_COLUMNS,
        Collection::Revenues => &REVENUE_COLUMNS,
        Collection::Expenses => &EXPENSE_COLUMNS,
    }
}

pub fn sheet_name(collection: Collection) -> &'static str {
    match collection {
        Collection::Clients => "Clients",
        Collection::Revenues => "Revenues",
        Collection::Expenses => "Expenses",
    }
}

/// Header-only table with the canonical columns of `collection`.
pub fn empty_table(collection: Collection) -> SheetTable {
    let names: Vec<&str> = columns(collection).iter().map(|column| column.name).collect();
    SheetTable::new(sheet_name(collection), &names)
}

pub fn clients_to_table(clients: &[Client]) -> SheetTable {
    let mut table = empty_table(Collection::Clients);
    table.rows = clients
        .iter()
        .map(|client| {
            vec![
                Cell::text(client.name.as_str()),
                Cell::optional_text(client.phone.as_deref()),
                client.last_service_date.map_or(Cell::Empty, Cell::Date),
                client
                    .last_service
                    .map_or(Cell::Empty, |service| Cell::text(service.label())),
            ]
        })
        .collect();
    table
}

pub fn revenues_to_table(revenues: &[RevenueEntry]) -> SheetTable {
    let mut table = empty_table(Collection::Revenues);
    table.rows = revenues
        .iter()
        .map(|entry| {
            vec![
                Cell::Date(entry.date),
                Cell::text(entry.client_name.as_str()),
                Cell::text(entry.service.label()),
                amount_cell(entry.amount),
                Cell::Bool(entry.paid),
                Cell::text(entry.payment_method.label()),
                Cell::optional_text(entry.note.as_deref()),
            ]
        })
        .collect();
    table
}

pub fn expenses_to_table(expenses: &[ExpenseEntry]) -> SheetTable {
    let mut table = empty_table(Collection::Expenses);
    table.rows = expenses
        .iter()
        .map(|entry| {
            vec![
                Cell::Date(entry.date),
                Cell::text(entry.category.label()),
                Cell::text(entry.description.as_str()),
                amount_cell(entry.amount),
                Cell::text(entry.payment_method.label()),
                Cell::optional_text(entry.note.as_deref()),
            ]
        })
        .collect();
    table
}

pub fn clients_from_table(table: &SheetTable) -> Result<Vec<Client>, SheetError> {
    let map = ColumnMap::resolve(table, &CLIENT_COLUMNS)?;
    table
        .data_rows()
        .map(|(line, cells)| {
            let row = map.row(cells, line);
            Ok(Client {
                name: row.required_text("Name")?,
                phone: row.text("Phone"),
                last_service_date: row.optional_date("LastServiceDate")?,
                last_service: row.optional_parsed("Service")?,
            })
        })
        .collect()
}

pub fn revenues_from_table(table: &SheetTable) -> Result<Vec<RevenueEntry>, SheetError> {
    let map = ColumnMap::resolve(table, &REVENUE_COLUMNS)?;
    table
        .data_rows()
        .map(|(line, cells)| {
            let row = map.row(cells, line);
            Ok(RevenueEntry {
                date: row.date("Date")?,
                client_name: row.required_text("ClientName")?,
                service: row.parsed("Service")?,
                amount: row.amount("Amount")?,
                paid: row.flag("Paid")?,
                payment_method: row.parsed("PaymentMethod")?,
                note: row.text("Note"),
            })
        })
        .collect()
}

pub fn expenses_from_table(table: &SheetTable) -> Result<Vec<ExpenseEntry>, SheetError> {
    let map = ColumnMap::resolve(table, &EXPENSE_COLUMNS)?;
    table
        .data_rows()
        .map(|(line, cells)| {
            let row = map.row(cells, line);
            Ok(ExpenseEntry {
                date: row.date("Date")?,
                category: row.parsed("Category")?,
                description: row.required_text("Description")?,
                amount: row.amount("Amount")?,
                payment_method: row.parsed("PaymentMethod")?,
                note: row.text("Note"),
            })
        })
        .collect()
}

/// Numbers when an `f64` holds the amount exactly, text otherwise.
fn amount_cell(amount: Decimal) -> Cell {
    let rendered = amount.to_string();
    match rendered.parse::<f64>() {
        Ok(value) if Decimal::from_f64(value) == Some(amount) => Cell::Number(value),
        _ => Cell::Text(rendered),
    }
}

struct ColumnMap {
    indices: HashMap<&'static str, usize>,
}

impl ColumnMap {
    fn resolve(table: &SheetTable, columns: &[Column]) -> Result<Self, SheetError> {
        let mut indices = HashMap::new();
        for column in columns {
            let mut names = vec![column.name];
            names.extend_from_slice(column.aliases);
            let index = table.column_index(&names).ok_or_else(|| {
                SheetError::InvalidWorkbook(format!(
                    "sheet '{}' is missing column '{}'",
                    table.sheet_name, column.name
                ))
            })?;
            indices.insert(column.name, index);
        }
        Ok(Self { indices })
    }

    fn row<'a>(&'a self, cells: &'a [Cell], line: usize) -> Row<'a> {
        Row {
            cells,
            line,
            map: self,
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

struct Row<'a> {
    cells: &'a [Cell],
    line: usize,
    map: &'a ColumnMap,
}

impl Row<'_> {
    fn cell(&self, column: &str) -> &Cell {
        self.map
            .indices
            .get(column)
            .and_then(|index| self.cells.get(*index))
            .unwrap_or(&EMPTY_CELL)
    }

    fn invalid(&self, column: &str, detail: impl std::fmt::Display) -> SheetError {
        SheetError::InvalidWorkbook(format!("row {}, column {column}: {detail}", self.line))
    }

    fn text(&self, column: &str) -> Option<String> {
        let value = match self.cell(column) {
            Cell::Empty => None,
            Cell::Text(value) => Some(value.trim().to_string()),
            Cell::Number(value) => Some(value.to_string()),
            Cell::Bool(value) => Some(value.to_string()),
            Cell::Date(value) => Some(dates::format(*value)),
        };
        value.filter(|value| !value.is_empty())
    }

    fn required_text(&self, column: &str) -> Result<String, SheetError> {
        self.text(column)
            .ok_or_else(|| self.invalid(column, "value is required"))
    }

    fn optional_date(&self, column: &str) -> Result<Option<NaiveDate>, SheetError> {
        let input = match self.cell(column) {
            Cell::Empty => return Ok(None),
            Cell::Date(value) => DateInput::Date(*value),
            Cell::Number(value) => DateInput::Serial(*value),
            Cell::Text(value) => DateInput::Text(value),
            Cell::Bool(_) => {
                return Err(self.invalid(column, "expected a date, found a boolean"));
            }
        };
        dates::normalize(input)
            .map(Some)
            .map_err(|err| self.invalid(column, err))
    }

    fn date(&self, column: &str) -> Result<NaiveDate, SheetError> {
        self.optional_date(column)?
            .ok_or_else(|| self.invalid(column, "value is required"))
    }

    fn amount(&self, column: &str) -> Result<Decimal, SheetError> {
        let amount = match self.cell(column) {
            Cell::Number(value) => Decimal::from_f64(*value)
                .ok_or_else(|| self.invalid(column, format!("'{value}' is not an amount")))?,
            Cell::Text(value) => parse_amount(value)
                .ok_or_else(|| self.invalid(column, format!("'{value}' is not an amount")))?,
            Cell::Empty => return Err(self.invalid(column, "value is required")),
            other => {
                return Err(self.invalid(column, format!("expected a number, found {other:?}")));
            }
        };
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(self.invalid(column, format!("negative amount {amount}")));
        }
        Ok(amount)
    }

    /// Empty cells read as `false`.
    fn flag(&self, column: &str) -> Result<bool, SheetError> {
        match self.cell(column) {
            Cell::Empty => Ok(false),
            Cell::Bool(value) => Ok(*value),
            Cell::Number(value) if *value == 1.0 => Ok(true),
            Cell::Number(value) if *value == 0.0 => Ok(false),
            Cell::Text(value) => parse_flag(value)
                .ok_or_else(|| self.invalid(column, format!("'{value}' is not yes/no"))),
            other => Err(self.invalid(column, format!("expected yes/no, found {other:?}"))),
        }
    }

    fn parsed<T>(&self, column: &str) -> Result<T, SheetError>
    where
        T: FromStr<Err = LedgerError>,
    {
        self.optional_parsed(column)?
            .ok_or_else(|| self.invalid(column, "value is required"))
    }

    fn optional_parsed<T>(&self, column: &str) -> Result<Option<T>, SheetError>
    where
        T: FromStr<Err = LedgerError>,
    {
        self.text(column)
            .map(|value| value.parse::<T>().map_err(|err| self.invalid(column, err)))
            .transpose()
    }
}

/// Accepts `120.50`, `120,50` and an optional `R$` prefix.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_start_matches("R$").trim();
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.replace(',', "")
    };
    Decimal::from_str(&normalized).ok()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "sim" | "yes" | "true" | "y" | "s" | "1" => Some(true),
        "não" | "nao" | "no" | "false" | "n" | "0" => Some(false),
        _ => None,
    }
}
