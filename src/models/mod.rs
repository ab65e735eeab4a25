mod attachment;
mod installment;
mod sale;
mod transaction;
mod wallet;

use serde::{Deserialize, Serialize};

pub use attachment::Attachment;
pub use installment::{Installment, InstallmentMetadata};
pub use sale::{SaleMetadata, SaleRecord, SaleTransactionLink};
pub use transaction::{Transaction, TransactionMetadata};
pub use wallet::{Wallet, WalletWithCount};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
    Deposit,
    Investment
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    Pending,
    Cleared
}

impl InstallmentStatus {
    /// Maps a payment status label from the sales source. Anything that is
    /// not recognisably settled stays pending.
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return Self::Pending
        };

        match label.trim().to_lowercase().as_str() {
            "pago" | "paga" | "confirmado" | "confirmada" | "liquidado" | "quitado" | "recebido" | "paid" | "cleared" => Self::Cleared,
            _ => Self::Pending
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletType {
    Manual,
    Bank,
    Cash,
    GestaoClick
}

impl WalletType {
    /// Wallets of these types are created by integrations and fall under duplicate cleanup.
    pub fn is_externally_synced(&self) -> bool {
        matches!(self, Self::GestaoClick)
    }
}
