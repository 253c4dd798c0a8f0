use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

use crate::studio::ledger::dates;
use crate::studio::ledger::io::{Cell, SheetError, SheetTable};

const DATE_NUM_FORMAT: &str = "dd/mm/yyyy";

/// Overwrites `path` with a single-sheet workbook holding `table`.
///
/// The workbook is saved next to the target first and then renamed over it,
/// so a failed save leaves the previous file intact.
pub fn write_table(path: &Path, table: &SheetTable) -> Result<(), SheetError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut workbook_writer = Workbook::new();
    let date_format = Format::new().set_num_format(DATE_NUM_FORMAT);

    let worksheet = workbook_writer.add_worksheet();
    worksheet.set_name(&table.sheet_name)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num = col_idx as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(value) => {
                    worksheet.write_string(row_num, col_num, value)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(row_num, col_num, *value)?;
                }
                Cell::Bool(value) => {
                    worksheet.write_boolean(row_num, col_num, *value)?;
                }
                Cell::Date(date) => match excel_date(*date) {
                    Some(datetime) => {
                        worksheet.write_date_with_format(
                            row_num,
                            col_num,
                            &datetime,
                            &date_format,
                        )?;
                    }
                    None => {
                        worksheet.write_string(row_num, col_num, dates::format(*date))?;
                    }
                },
            }
        }
    }

    let col_end = (table.columns.len() as u16).saturating_sub(1);
    worksheet.autofilter(0, 0, table.rows.len() as u32, col_end)?;
    worksheet.set_freeze_panes(1, 0)?;

    let staging = staging_path(path);
    if let Err(err) = workbook_writer.save(&staging) {
        let _ = fs::remove_file(&staging);
        return Err(err.into());
    }
    if let Err(err) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(err.into());
    }
    Ok(())
}

/// Dates outside 1900-9999 have no serial and are written as text.
fn excel_date(date: NaiveDate) -> Option<ExcelDateTime> {
    let year = u16::try_from(date.year()).ok().filter(|year| *year >= 1900)?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8).ok()
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::ledger::io::excel_read;
    use tempfile::tempdir;

    #[test]
    fn typed_cells_survive_a_write_read_cycle() {
        let mut table = SheetTable::new("Revenues", &["Date", "Client", "Amount", "Paid"]);
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        table.rows.push(vec![
            Cell::Date(date),
            Cell::text("Ana"),
            Cell::Number(120.5),
            Cell::Bool(true),
        ]);
        table.rows.push(vec![Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty]);
        table.rows.push(vec![
            Cell::Date(NaiveDate::from_ymd_opt(1899, 12, 31).unwrap()),
            Cell::text("Bia"),
            Cell::Empty,
            Cell::Bool(false),
        ]);

        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("nested").join("revenues.xlsx");
        write_table(&path, &table).expect("workbook written");
        assert!(!staging_path(&path).exists());

        let restored = excel_read::read_table(&path).expect("workbook read");
        assert_eq!(restored.sheet_name, "Revenues");
        assert_eq!(restored.columns, table.columns);
        let lines: Vec<usize> = restored.data_rows().map(|(line, _)| line).collect();
        assert_eq!(lines, vec![2, 4], "blank rows keep their place");
        let row = &restored.rows[0];
        match &row[0] {
            Cell::Date(restored_date) => assert_eq!(*restored_date, date),
            Cell::Number(serial) => assert_eq!(*serial, 45415.0),
            other => panic!("unexpected date cell {other:?}"),
        }
        assert_eq!(row[1], Cell::Text("Ana".into()));
        assert_eq!(row[2], Cell::Number(120.5));
        assert_eq!(row[3], Cell::Bool(true));
        assert_eq!(restored.rows[2][0], Cell::Text("31/12/1899".into()));
    }

    #[test]
    fn dates_use_the_spreadsheet_serial_range() {
        let ymd = |year, month, day| NaiveDate::from_ymd_opt(year, month, day).unwrap();
        assert_eq!(excel_date(ymd(2024, 5, 3)).map(|date| date.to_excel()), Some(45415.0));
        assert_eq!(excel_date(ymd(1900, 3, 1)).map(|date| date.to_excel()), Some(61.0));
        assert!(excel_date(ymd(9999, 12, 31)).is_some());
        assert!(excel_date(ymd(1899, 12, 31)).is_none());
        assert!(excel_date(ymd(10000, 1, 1)).is_none());
    }

    #[test]
    fn header_only_table_is_readable() {
        let table = SheetTable::new("Expenses", &["Date", "Category"]);
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("expenses.xlsx");
        write_table(&path, &table).expect("workbook written");

        let restored = excel_read::read_table(&path).expect("workbook read");
        assert_eq!(restored.columns, vec!["Date".to_string(), "Category".to_string()]);
        assert!(restored.rows.is_empty());
    }

    #[test]
    fn column_lookup_ignores_case() {
        let table = SheetTable::new("Clients", &["Name", "Phone"]);
        assert_eq!(table.column_index(&["phone"]), Some(1));
        assert_eq!(table.column_index(&["Telefone", "PHONE"]), Some(1));
        assert_eq!(table.column_index(&["Service"]), None);
    }
}
