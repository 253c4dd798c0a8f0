use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::studio::ledger::dates;
use crate::studio::ledger::io::{Cell, SheetError, SheetTable};

/// Reads the first worksheet of a workbook written by
/// [`excel_write`](crate::io::excel_write), or by any spreadsheet tool that
/// keeps a single header row on top. Blank rows are kept so row positions
/// match the sheet.
pub fn read_table(path: &Path) -> Result<SheetTable, SheetError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SheetError::InvalidWorkbook("workbook has no sheets".into()))?;
    let range = read_required_sheet(&mut workbook, &sheet_name)?;

    let header_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|cell| cell_to_string(Some(cell))).collect(),
        None => {
            return Err(SheetError::InvalidWorkbook(format!(
                "sheet '{sheet_name}' has no header row"
            )));
        }
    };

    let rows = rows
        .map(|row| row.iter().map(to_cell).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SheetTable {
        sheet_name,
        columns,
        rows,
        first_line: header_row + 2,
    })
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<calamine::Range<DataType>, SheetError> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| SheetError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(SheetError::from)?;
    Ok(range)
}

fn to_cell(data: &DataType) -> Result<Cell, SheetError> {
    Ok(match data {
        DataType::Empty => Cell::Empty,
        DataType::String(value) => Cell::text(value.as_str()),
        DataType::Float(value) => Cell::Number(*value),
        DataType::Int(value) => Cell::Number(*value as f64),
        DataType::Bool(value) => Cell::Bool(*value),
        DataType::DateTime(serial) => dates::from_serial(*serial)
            .map(Cell::Date)
            .map_err(|err| SheetError::InvalidWorkbook(err.to_string()))?,
        DataType::DateTimeIso(value) => data
            .as_date()
            .map_or_else(|| Cell::text(value.as_str()), Cell::Date),
        DataType::Error(err) => {
            return Err(SheetError::InvalidWorkbook(format!("cell holds error {err}")));
        }
        other => Cell::text(other.to_string()),
    })
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.trim().to_string(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
