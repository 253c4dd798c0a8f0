pub mod excel_read;
pub mod excel_write;

use chrono::NaiveDate;
use thiserror::Error;

/// A single typed spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text cell, or [`Cell::Empty`] when the value is blank.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        value.map_or(Cell::Empty, Cell::text)
    }
}

/// A header row plus data rows, materialised as one worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    /// Data rows in sheet order, blank rows included.
    pub rows: Vec<Vec<Cell>>,
    /// 1-based sheet line of `rows[0]`.
    pub first_line: usize,
}

impl SheetTable {
    pub fn new(sheet_name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows: Vec::new(),
            first_line: 2,
        }
    }

    /// Non-blank rows paired with their line number in the sheet.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[Cell])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| !cells.iter().all(Cell::is_empty))
            .map(move |(index, cells)| (self.first_line + index, cells.as_slice()))
    }

    /// Index of the first column whose header matches one of `names`.
    /// Headers compare trimmed and case-insensitively.
    pub fn column_index(&self, names: &[&str]) -> Option<usize> {
        self.columns.iter().position(|header| {
            names
                .iter()
                .any(|name| header.trim().to_lowercase() == name.to_lowercase())
        })
    }
}

/// Failures raised by the workbook adapters. The store attaches the
/// collection and path before handing them to callers.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),
}
