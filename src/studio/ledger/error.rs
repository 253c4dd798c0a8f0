use std::path::PathBuf;

use thiserror::Error;

use crate::studio::ledger::model::Collection;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error type covering the failures that can occur while recording, loading,
/// or persisting ledger data.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Raised when a submitted record is missing a required field or carries
    /// a negative amount.
    #[error("validation error: {0}")]
    Validation(String),

    /// Raised when a date value cannot be interpreted as a calendar date.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Raised when a backing file exists but cannot be read as the expected
    /// collection.
    #[error("failed to read {collection} from {}: {reason}", path.display())]
    StorageRead {
        collection: Collection,
        path: PathBuf,
        reason: String,
    },

    /// Raised when a backing file could not be overwritten. The in-memory
    /// collection still holds the pending record.
    #[error("failed to write {collection} to {}: {reason}", path.display())]
    StorageWrite {
        collection: Collection,
        path: PathBuf,
        reason: String,
    },

    /// Raised when the configuration file is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Wrapper for IO failures outside the ledger files, such as reading the
    /// configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl LedgerError {
    pub(crate) fn read(
        collection: Collection,
        path: impl Into<PathBuf>,
        reason: impl ToString,
    ) -> Self {
        LedgerError::StorageRead {
            collection,
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(
        collection: Collection,
        path: impl Into<PathBuf>,
        reason: impl ToString,
    ) -> Self {
        LedgerError::StorageWrite {
            collection,
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
