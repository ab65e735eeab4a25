use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{Attachment, Installment, SaleRecord, SaleTransactionLink, Transaction, Wallet};
use crate::storage::{StoreError, StoreResult};

/// Serialized form of the whole ledger, as kept on disk by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub sales: Vec<SaleRecord>,
    #[serde(default)]
    pub installments: Vec<Installment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    #[serde(default)]
    pub links: Vec<SaleTransactionLink>
}

impl LedgerSnapshot {
    /// Reads a snapshot file. A missing file is an empty ledger.
    pub fn read_from(path: &Path) -> StoreResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(error) => return Err(StoreError::Backend(format!("Error reading ledger at path: {} | {error}", path.display())))
        };

        serde_json::from_str(&contents)
            .map_err(|error| StoreError::Backend(format!("Ledger at path {} is not valid: {error}", path.display())))
    }

    pub fn write_to(&self, path: &Path) -> StoreResult<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|error| StoreError::Backend(error.to_string()))?;

        fs::write(path, contents)
            .map_err(|error| StoreError::Backend(format!("Error writing ledger at path: {} | {error}", path.display())))
    }
}
