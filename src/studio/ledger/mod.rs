pub mod clients;
pub mod config;
pub mod dates;
pub mod error;
pub mod io;
pub mod model;
pub mod report;
pub mod service;
pub mod store;

pub use error::{LedgerError, Result};
