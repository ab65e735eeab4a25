mod errors;
mod memory_ledger;
mod snapshot;
#[cfg(test)]
pub mod testing;
mod user_locks;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::models::{Attachment, Installment, SaleMetadata, SaleRecord, SaleTransactionLink, Transaction, Wallet, WalletWithCount};
use crate::types::RecordId;

pub use errors::{StoreError, StoreResult};
pub use memory_ledger::{LedgerCounts, MemoryLedger};
pub use snapshot::LedgerSnapshot;
pub use user_locks::UserLocks;

/// Persistence seam for the ledger.
///
/// Each call is atomic for the entity it touches; nothing spans several
/// calls. `merge_sale_metadata` must splice the patch into the stored value
/// rather than replace it.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    async fn find_sales(&self, user_id: &str, source: &str) -> StoreResult<Vec<SaleRecord>>;
    async fn create_sale(&self, sale: SaleRecord) -> StoreResult<SaleRecord>;
    async fn merge_sale_metadata(&self, sale_id: RecordId, patch: &SaleMetadata) -> StoreResult<SaleRecord>;

    async fn find_installments(&self, sale_id: RecordId) -> StoreResult<Vec<Installment>>;
    async fn create_installment(&self, installment: Installment) -> StoreResult<Installment>;

    async fn find_attachments(&self, transaction_id: RecordId) -> StoreResult<Vec<Attachment>>;
    async fn create_attachment(&self, attachment: Attachment) -> StoreResult<Attachment>;
    async fn reassign_attachments(&self, from_transaction: RecordId, to_transaction: RecordId) -> StoreResult<usize>;

    async fn find_transactions(&self, user_id: &str) -> StoreResult<Vec<Transaction>>;
    async fn transaction_exists(&self, transaction_id: RecordId) -> StoreResult<bool>;
    async fn create_transaction(&self, transaction: Transaction) -> StoreResult<Transaction>;
    async fn delete_transaction(&self, transaction_id: RecordId) -> StoreResult<()>;

    async fn find_sale_link(&self, sale_id: RecordId) -> StoreResult<Option<SaleTransactionLink>>;
    async fn create_sale_link(&self, link: SaleTransactionLink) -> StoreResult<SaleTransactionLink>;
    async fn relink_sales(&self, from_transaction: RecordId, to_transaction: RecordId) -> StoreResult<usize>;

    async fn find_wallets(&self, user_id: &str) -> StoreResult<Vec<WalletWithCount>>;
    async fn create_wallet(&self, wallet: Wallet) -> StoreResult<Wallet>;
    async fn reassign_wallet_transactions(&self, from_wallet: RecordId, to_wallet: RecordId) -> StoreResult<usize>;
    async fn delete_wallet(&self, wallet_id: RecordId) -> StoreResult<()>;
}

/// Runs a store call under a deadline; running out of time is a `StoreError::Timeout`.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>
{
    timeout(deadline, call).await.unwrap_or(Err(StoreError::Timeout(deadline)))
}
