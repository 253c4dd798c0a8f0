//! Calendar date normalisation.
//!
//! Dates reach the ledger as picker values, spreadsheet serials, or text in
//! whatever shape the workbook happened to store. Everything is folded into a
//! [`NaiveDate`] before it is kept, and rendered back as `DD/MM/YYYY`.

use std::ops::RangeInclusive;

use calamine::DataType;
use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::studio::ledger::error::{LedgerError, Result};

/// Display format for dates.
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";
/// Format of the monthly aggregation bucket.
pub const MONTH_KEY_FORMAT: &str = "%m/%Y";

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Largest serial the 1900 date system can represent (31/12/9999).
const MAX_SERIAL: f64 = 2_958_465.0;

/// Years a workbook can hold and read back as a date.
pub const STORABLE_YEARS: RangeInclusive<i32> = 1..=9999;

/// A date value in any of the shapes the ledger accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateInput<'a> {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Spreadsheet serial day number in the 1900 date system.
    Serial(f64),
    Text(&'a str),
    Missing,
}

impl From<NaiveDate> for DateInput<'_> {
    fn from(value: NaiveDate) -> Self {
        DateInput::Date(value)
    }
}

impl From<NaiveDateTime> for DateInput<'_> {
    fn from(value: NaiveDateTime) -> Self {
        DateInput::DateTime(value)
    }
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(value: &'a str) -> Self {
        DateInput::Text(value)
    }
}

impl<'a> From<&'a String> for DateInput<'a> {
    fn from(value: &'a String) -> Self {
        DateInput::Text(value.as_str())
    }
}

impl From<Option<NaiveDate>> for DateInput<'_> {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map_or(DateInput::Missing, DateInput::Date)
    }
}

/// Canonicalises a date, date-time, serial, or formatted string into a
/// calendar date.
pub fn normalize<'a>(raw: impl Into<DateInput<'a>>) -> Result<NaiveDate> {
    match raw.into() {
        DateInput::Date(date) => Ok(date),
        DateInput::DateTime(datetime) => Ok(datetime.date()),
        DateInput::Serial(serial) => from_serial(serial),
        DateInput::Text(text) => parse_text(text),
        DateInput::Missing => Err(LedgerError::InvalidDate("no date given".into())),
    }
}

/// Renders a date as `DD/MM/YYYY`. Text passes through unchanged and missing
/// values render as an empty string.
pub fn format<'a>(value: impl Into<DateInput<'a>>) -> String {
    match value.into() {
        DateInput::Date(date) => date.format(DISPLAY_FORMAT).to_string(),
        DateInput::DateTime(datetime) => datetime.format(DISPLAY_FORMAT).to_string(),
        DateInput::Serial(serial) => match from_serial(serial) {
            Ok(date) => date.format(DISPLAY_FORMAT).to_string(),
            Err(_) => serial.to_string(),
        },
        DateInput::Text(text) => text.to_string(),
        DateInput::Missing => String::new(),
    }
}

/// Monthly bucket key, `MM/YYYY`.
pub fn month_key(date: NaiveDate) -> String {
    date.format(MONTH_KEY_FORMAT).to_string()
}

/// Parses a `MM/YYYY` key into `(year, month)`.
pub fn parse_month_key(key: &str) -> Result<(i32, u32)> {
    let invalid = || LedgerError::InvalidDate(format!("'{key}' is not a MM/YYYY month"));
    let (month, year) = key.trim().split_once('/').ok_or_else(invalid)?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || year.to_string().len() != 4 {
        return Err(invalid());
    }
    Ok((year, month))
}

/// Converts a 1900-system serial to a date, ignoring any time fraction.
pub fn from_serial(serial: f64) -> Result<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return Err(LedgerError::InvalidDate(format!(
            "serial {serial} is outside the spreadsheet date range"
        )));
    }
    DataType::DateTime(serial.trunc())
        .as_date()
        .ok_or_else(|| LedgerError::InvalidDate(format!("serial {serial} overflows")))
}

/// Fails for dates a workbook cannot store and read back.
pub fn ensure_storable(date: NaiveDate) -> Result<()> {
    if STORABLE_YEARS.contains(&date.year()) {
        Ok(())
    } else {
        Err(LedgerError::InvalidDate(format!(
            "{} is outside the years {} to {}",
            date,
            STORABLE_YEARS.start(),
            STORABLE_YEARS.end()
        )))
    }
}

fn parse_text(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidDate("empty date".into()));
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                .map(|datetime| datetime.date())
        })
        .ok_or_else(|| LedgerError::InvalidDate(format!("unrecognised date '{trimmed}'")))
}
