//! Durable storage for the ledger collections.
//!
//! Each collection lives in its own single-sheet workbook. Every mutation
//! rewrites the whole file for the affected collection; there is no
//! incremental append format and no locking, so one store must be the only
//! writer of its files.

pub mod schema;

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use chrono::NaiveDate;

use crate::studio::ledger::dates;
use crate::studio::ledger::error::{LedgerError, Result};
use crate::studio::ledger::io::{SheetError, SheetTable, excel_read, excel_write};
use crate::studio::ledger::model::{Client, Collection, ExpenseEntry, RevenueEntry, non_blank};

/// Locations of the three backing workbooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub clients: PathBuf,
    pub revenues: PathBuf,
    pub expenses: PathBuf,
}

impl StorePaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            clients: dir.join("clients.xlsx"),
            revenues: dir.join("revenues.xlsx"),
            expenses: dir.join("expenses.xlsx"),
        }
    }

    pub fn path(&self, collection: Collection) -> &Path {
        match collection {
            Collection::Clients => &self.clients,
            Collection::Revenues => &self.revenues,
            Collection::Expenses => &self.expenses,
        }
    }
}

/// Outcome of loading each collection independently. A corrupt file only
/// fails its own collection.
#[derive(Debug)]
pub struct LoadedLedger {
    pub clients: Result<Vec<Client>>,
    pub revenues: Result<Vec<RevenueEntry>>,
    pub expenses: Result<Vec<ExpenseEntry>>,
}

/// Loads every collection, substituting an empty collection for absent files.
#[instrument(level = "info", skip_all)]
pub fn load(paths: &StorePaths) -> LoadedLedger {
    LoadedLedger {
        clients: load_collection(Collection::Clients, &paths.clients, schema::clients_from_table),
        revenues: load_collection(
            Collection::Revenues,
            &paths.revenues,
            schema::revenues_from_table,
        ),
        expenses: load_collection(
            Collection::Expenses,
            &paths.expenses,
            schema::expenses_from_table,
        ),
    }
}

fn load_collection<T>(
    collection: Collection,
    path: &Path,
    decode: fn(&SheetTable) -> std::result::Result<Vec<T>, SheetError>,
) -> Result<Vec<T>> {
    if !path.exists() {
        debug!(%collection, path = %path.display(), "no backing file, starting empty");
        return Ok(Vec::new());
    }

    let records = excel_read::read_table(path)
        .and_then(|table| decode(&table))
        .map_err(|err| {
            warn!(%collection, path = %path.display(), error = %err, "collection failed to load");
            LedgerError::read(collection, path, err)
        })?;
    info!(%collection, record_count = records.len(), "collection loaded");
    Ok(records)
}

fn write_collection(collection: Collection, path: &Path, table: &SheetTable) -> Result<()> {
    excel_write::write_table(path, table).map_err(|err| {
        warn!(%collection, path = %path.display(), error = %err, "collection failed to persist");
        LedgerError::write(collection, path, err)
    })?;
    debug!(%collection, row_count = table.rows.len(), "collection persisted");
    Ok(())
}

/// Rejects revenue entries with a blank client name, a negative amount, or a
/// date no workbook can hold.
pub fn validate_revenue(entry: &RevenueEntry) -> Result<()> {
    validate_date(entry.date)?;
    if entry.client_name.trim().is_empty() {
        return Err(LedgerError::Validation("client name is required".into()));
    }
    if entry.amount.is_sign_negative() && !entry.amount.is_zero() {
        return Err(LedgerError::Validation(format!(
            "amount must not be negative, got {}",
            entry.amount
        )));
    }
    Ok(())
}

/// Rejects expense entries with a blank description, a negative amount, or a
/// date no workbook can hold.
pub fn validate_expense(entry: &ExpenseEntry) -> Result<()> {
    validate_date(entry.date)?;
    if entry.description.trim().is_empty() {
        return Err(LedgerError::Validation("description is required".into()));
    }
    if entry.amount.is_sign_negative() && !entry.amount.is_zero() {
        return Err(LedgerError::Validation(format!(
            "amount must not be negative, got {}",
            entry.amount
        )));
    }
    Ok(())
}

fn validate_date(date: NaiveDate) -> Result<()> {
    dates::ensure_storable(date).map_err(|err| LedgerError::Validation(err.to_string()))
}

/// In-memory collections plus the files they are mirrored to.
#[derive(Debug)]
pub struct LedgerStore {
    paths: StorePaths,
    clients: Vec<Client>,
    revenues: Vec<RevenueEntry>,
    expenses: Vec<ExpenseEntry>,
}

impl LedgerStore {
    /// Loads all three collections, failing with the first collection that
    /// could not be read.
    #[instrument(level = "info", skip_all, fields(dir = ?paths.revenues.parent()))]
    pub fn open(paths: StorePaths) -> Result<Self> {
        let loaded = load(&paths);
        Ok(Self {
            clients: loaded.clients?,
            revenues: loaded.revenues?,
            expenses: loaded.expenses?,
            paths,
        })
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    /// Revenue entries in insertion order.
    pub fn revenues(&self) -> &[RevenueEntry] {
        &self.revenues
    }

    /// Expense entries in insertion order.
    pub fn expenses(&self) -> &[ExpenseEntry] {
        &self.expenses
    }

    /// Validates and appends a revenue entry, then rewrites the revenues file.
    ///
    /// When the write fails the entry stays in memory and
    /// [`LedgerError::StorageWrite`] is returned; [`persist_revenues`](Self::persist_revenues)
    /// retries the write alone.
    #[instrument(level = "info", skip_all, fields(client = %entry.client_name, amount = %entry.amount))]
    pub fn append_revenue(&mut self, mut entry: RevenueEntry) -> Result<()> {
        validate_revenue(&entry)?;
        entry.client_name = entry.client_name.trim().to_string();
        entry.note = non_blank(entry.note);
        self.revenues.push(entry);
        self.persist_revenues()
    }

    /// Validates and appends an expense entry, then rewrites the expenses
    /// file. Write failures behave as in [`append_revenue`](Self::append_revenue).
    #[instrument(level = "info", skip_all, fields(category = %entry.category, amount = %entry.amount))]
    pub fn append_expense(&mut self, mut entry: ExpenseEntry) -> Result<()> {
        validate_expense(&entry)?;
        entry.description = entry.description.trim().to_string();
        entry.note = non_blank(entry.note);
        self.expenses.push(entry);
        self.persist_expenses()
    }

    /// Replaces the client roster and overwrites the clients file.
    #[instrument(level = "info", skip_all, fields(client_count = clients.len()))]
    pub fn save_clients(&mut self, clients: Vec<Client>) -> Result<()> {
        self.clients = clients;
        self.persist_clients()
    }

    pub fn persist_clients(&self) -> Result<()> {
        write_collection(
            Collection::Clients,
            &self.paths.clients,
            &schema::clients_to_table(&self.clients),
        )
    }

    pub fn persist_revenues(&self) -> Result<()> {
        write_collection(
            Collection::Revenues,
            &self.paths.revenues,
            &schema::revenues_to_table(&self.revenues),
        )
    }

    pub fn persist_expenses(&self) -> Result<()> {
        write_collection(
            Collection::Expenses,
            &self.paths.expenses,
            &schema::expenses_to_table(&self.expenses),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::ledger::model::{ExpenseCategory, PaymentMethod, Service};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::tempdir;

    fn revenue(amount: rust_decimal::Decimal) -> RevenueEntry {
        RevenueEntry {
            date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            client_name: "Ana".into(),
            service: Service::Eyebrow,
            amount,
            paid: false,
            payment_method: PaymentMethod::Cash,
            note: Some("first visit".into()),
        }
    }

    fn expense(amount: rust_decimal::Decimal) -> ExpenseEntry {
        ExpenseEntry {
            date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            category: ExpenseCategory::Rent,
            description: "May rent".into(),
            amount,
            payment_method: PaymentMethod::Pix,
            note: None,
        }
    }

    #[test]
    fn absent_files_load_as_empty_collections() {
        let dir = tempdir().expect("temporary directory");
        let store = LedgerStore::open(StorePaths::in_dir(dir.path())).expect("store opened");
        assert!(store.clients().is_empty());
        assert!(store.revenues().is_empty());
        assert!(store.expenses().is_empty());
        assert!(!store.paths().revenues.exists(), "loading never creates files");
    }

    #[test]
    fn negative_amounts_are_rejected_before_anything_is_written() {
        let dir = tempdir().expect("temporary directory");
        let mut store = LedgerStore::open(StorePaths::in_dir(dir.path())).expect("store opened");

        let error = store.append_revenue(revenue(dec!(-0.01))).unwrap_err();
        assert!(matches!(error, LedgerError::Validation(_)));
        let error = store.append_expense(expense(dec!(-10))).unwrap_err();
        assert!(matches!(error, LedgerError::Validation(_)));

        assert!(store.revenues().is_empty());
        assert!(!store.paths().revenues.exists());
        assert!(!store.paths().expenses.exists());
    }

    #[test]
    fn zero_and_positive_amounts_are_accepted() {
        let dir = tempdir().expect("temporary directory");
        let mut store = LedgerStore::open(StorePaths::in_dir(dir.path())).expect("store opened");
        store.append_revenue(revenue(dec!(0))).expect("zero revenue");
        store.append_revenue(revenue(dec!(35.5))).expect("positive revenue");
        store.append_expense(expense(dec!(0))).expect("zero expense");
        assert_eq!(store.revenues().len(), 2);
        assert_eq!(store.expenses().len(), 1);
    }

    #[test]
    fn dates_past_year_9999_are_rejected_before_anything_is_written() {
        let dir = tempdir().expect("temporary directory");
        let paths = StorePaths::in_dir(dir.path());
        let mut store = LedgerStore::open(paths.clone()).expect("store opened");
        let far_future = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();

        let mut entry = revenue(dec!(50));
        entry.date = far_future;
        let error = store.append_revenue(entry).unwrap_err();
        assert!(matches!(error, LedgerError::Validation(_)));

        let mut entry = expense(dec!(50));
        entry.date = far_future;
        let error = store.append_expense(entry).unwrap_err();
        assert!(matches!(error, LedgerError::Validation(_)));

        let mut entry = revenue(dec!(50));
        entry.date = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
        store.append_revenue(entry).expect("last storable day accepted");

        assert!(store.expenses().is_empty());
        let reloaded = LedgerStore::open(paths).expect("store reopened");
        assert_eq!(reloaded.revenues(), store.revenues());
    }

    #[test]
    fn amounts_and_early_dates_reload_unchanged() {
        let dir = tempdir().expect("temporary directory");
        let paths = StorePaths::in_dir(dir.path());
        let mut store = LedgerStore::open(paths.clone()).expect("store opened");

        let mut precise = revenue(dec!(12345678901234.5678));
        precise.date = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
        store.append_revenue(precise).expect("precise revenue");
        store.append_revenue(revenue(dec!(180.75))).expect("plain revenue");
        store.append_expense(expense(dec!(89.9))).expect("plain expense");

        let reloaded = LedgerStore::open(paths).expect("store reopened");
        assert_eq!(reloaded.revenues(), store.revenues());
        assert_eq!(reloaded.revenues()[0].amount, dec!(12345678901234.5678));
        assert_eq!(reloaded.expenses(), store.expenses());
    }

    #[test]
    fn blank_required_text_is_rejected() {
        let mut entry = revenue(dec!(10));
        entry.client_name = "   ".into();
        assert!(matches!(validate_revenue(&entry), Err(LedgerError::Validation(_))));

        let mut entry = expense(dec!(10));
        entry.description = String::new();
        assert!(matches!(validate_expense(&entry), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn corrupt_file_only_fails_its_own_collection() {
        let dir = tempdir().expect("temporary directory");
        let paths = StorePaths::in_dir(dir.path());
        let mut store = LedgerStore::open(paths.clone()).expect("store opened");
        store.append_expense(expense(dec!(1200))).expect("expense recorded");
        fs::write(&paths.revenues, b"definitely not a workbook").expect("corrupt file written");

        let loaded = load(&paths);
        assert!(matches!(
            loaded.revenues,
            Err(LedgerError::StorageRead { collection: Collection::Revenues, .. })
        ));
        assert_eq!(loaded.expenses.expect("expenses still load").len(), 1);
        assert!(loaded.clients.expect("clients still load").is_empty());

        let error = LedgerStore::open(paths).unwrap_err();
        assert!(matches!(error, LedgerError::StorageRead { .. }));
    }

    #[test]
    fn failed_write_keeps_the_entry_in_memory() {
        let dir = tempdir().expect("temporary directory");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").expect("blocking file written");
        let mut paths = StorePaths::in_dir(dir.path());
        paths.revenues = blocker.join("revenues.xlsx");

        let mut store = LedgerStore::open(paths).expect("store opened");
        let error = store.append_revenue(revenue(dec!(80))).unwrap_err();
        assert!(matches!(
            error,
            LedgerError::StorageWrite { collection: Collection::Revenues, .. }
        ));
        assert_eq!(store.revenues().len(), 1);
        assert!(store.persist_revenues().is_err());
    }

    #[test]
    fn saved_clients_are_reloaded() {
        let dir = tempdir().expect("temporary directory");
        let paths = StorePaths::in_dir(dir.path());
        let mut store = LedgerStore::open(paths.clone()).expect("store opened");
        let roster = vec![Client {
            name: "Ana".into(),
            phone: Some("+55 11 98765-4321".into()),
            last_service_date: NaiveDate::from_ymd_opt(2024, 5, 3),
            last_service: Some(Service::Makeup),
        }];
        store.save_clients(roster.clone()).expect("clients saved");

        let reloaded = LedgerStore::open(paths).expect("store reopened");
        assert_eq!(reloaded.clients(), roster.as_slice());
    }
}
