//! Entry point used by front-ends: records submissions and answers report
//! queries against the current state of the store.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::studio::ledger::clients;
use crate::studio::ledger::config::LedgerConfig;
use crate::studio::ledger::error::{LedgerError, Result};
use crate::studio::ledger::model::{
    Client, Collection, ExpenseCategory, ExpenseEntry, RevenueEntry, RevenueSubmission,
};
use crate::studio::ledger::report::{self, MonthFilter, Totals};
use crate::studio::ledger::store::LedgerStore;

/// Opens the ledger described by `config`.
pub fn load_ledger(config: &LedgerConfig) -> Result<Ledger> {
    Ledger::open(config)
}

#[derive(Debug)]
pub struct Ledger {
    store: LedgerStore,
}

impl Ledger {
    #[instrument(level = "info", skip_all, fields(data_dir = %config.data_dir.display()))]
    pub fn open(config: &LedgerConfig) -> Result<Self> {
        config.validate()?;
        let store = LedgerStore::open(config.store_paths())?;
        info!(
            clients = store.clients().len(),
            revenues = store.revenues().len(),
            expenses = store.expenses().len(),
            "ledger opened"
        );
        Ok(Self { store })
    }

    pub fn from_store(store: LedgerStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Records a service: appends the revenue row, then refreshes the client
    /// roster from it. Once the entry is accepted the roster is refreshed in
    /// memory even if a write fails; the first write error is returned and
    /// [`persist`](Self::persist) retries each collection.
    #[instrument(level = "info", skip_all, fields(client = %submission.client_name))]
    pub fn record_revenue(&mut self, submission: RevenueSubmission) -> Result<()> {
        let (entry, phone) = submission.into_entry();
        let (name, date, service) = (entry.client_name.clone(), entry.date, entry.service);

        let appended = self.store.append_revenue(entry);
        if let Err(LedgerError::Validation(_)) = appended {
            return appended;
        }

        let roster = clients::upsert(
            self.store.clients(),
            &name,
            phone.as_deref(),
            date,
            service,
        );
        let saved = self.store.save_clients(roster);
        appended.and(saved)
    }

    #[instrument(level = "info", skip_all, fields(category = %entry.category))]
    pub fn record_expense(&mut self, entry: ExpenseEntry) -> Result<()> {
        self.store.append_expense(entry)
    }

    /// Rewrites one collection's file from memory, e.g. after a failed write.
    pub fn persist(&self, collection: Collection) -> Result<()> {
        match collection {
            Collection::Clients => self.store.persist_clients(),
            Collection::Revenues => self.store.persist_revenues(),
            Collection::Expenses => self.store.persist_expenses(),
        }
    }

    pub fn list_revenues(&self) -> &[RevenueEntry] {
        self.store.revenues()
    }

    pub fn list_expenses(&self) -> &[ExpenseEntry] {
        self.store.expenses()
    }

    pub fn clients(&self) -> &[Client] {
        self.store.clients()
    }

    pub fn find_client(&self, name: &str) -> Option<&Client> {
        clients::find(self.store.clients(), name)
    }

    pub fn available_months(&self) -> Vec<String> {
        report::available_months(self.store.revenues())
    }

    pub fn totals(&self, filter: MonthFilter) -> Totals {
        report::totals(self.store.revenues(), self.store.expenses(), filter)
    }

    pub fn by_category(&self) -> BTreeMap<ExpenseCategory, Decimal> {
        report::by_category(self.store.expenses())
    }
}
