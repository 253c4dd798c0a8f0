use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::studio::ledger::error::{LedgerError, Result};
use crate::studio::ledger::store::StorePaths;

/// Where the ledger workbooks live. File names are resolved against
/// `data_dir` unless they are absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub data_dir: PathBuf,
    pub clients_file: PathBuf,
    pub revenues_file: PathBuf,
    pub expenses_file: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            clients_file: PathBuf::from("clients.xlsx"),
            revenues_file: PathBuf::from("revenues.xlsx"),
            expenses_file: PathBuf::from("expenses.xlsx"),
        }
    }
}

impl LedgerConfig {
    /// Defaults rooted at `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Reads a JSON configuration file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        let config: LedgerConfig = serde_json::from_str(&source)?;
        config.validate()?;
        debug!(path = %path.display(), ?config, "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let files = [
            ("clients_file", &self.clients_file),
            ("revenues_file", &self.revenues_file),
            ("expenses_file", &self.expenses_file),
        ];
        for (key, file) in files {
            if file.as_os_str().is_empty() {
                return Err(LedgerError::Config(format!("{key} must not be empty")));
            }
        }
        let paths = self.store_paths();
        if paths.clients == paths.revenues
            || paths.clients == paths.expenses
            || paths.revenues == paths.expenses
        {
            return Err(LedgerError::Config(
                "each collection needs its own file".into(),
            ));
        }
        Ok(())
    }

    pub fn store_paths(&self) -> StorePaths {
        StorePaths {
            clients: self.data_dir.join(&self.clients_file),
            revenues: self.data_dir.join(&self.revenues_file),
            expenses: self.data_dir.join(&self.expenses_file),
        }
    }
}
