//! Core library for the studio-ledger command line application.
//!
//! The library records service revenue and expenses for a single-operator
//! studio, keeps a client roster derived from the services recorded, and
//! answers monthly and per-category reporting queries. Storage adapters live
//! under [`studio::ledger::io`] and [`studio::ledger::store`], record types in
//! [`studio::ledger::model`], date handling in [`studio::ledger::dates`], the
//! roster and report logic in [`studio::ledger::clients`] and
//! [`studio::ledger::report`], and the front-end facing entry point in
//! [`studio::ledger::service`].

pub mod studio;

pub use studio::ledger::service::{Ledger, load_ledger};
pub use studio::ledger::{
    LedgerError, Result, clients, config, dates, error, io, model, report, service, store,
};
