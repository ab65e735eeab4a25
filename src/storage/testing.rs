use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::models::{Attachment, Installment, SaleMetadata, SaleRecord, SaleTransactionLink, Transaction, Wallet, WalletWithCount};
use crate::storage::{LedgerStore, MemoryLedger, StoreError, StoreResult};
use crate::types::RecordId;

/// A `MemoryLedger` with switchable faults.
#[derive(Default)]
pub struct FlakyLedger {
    pub inner: MemoryLedger,
    pub failing_payment_ids: Mutex<HashSet<String>>,
    pub failing_deletes: Mutex<HashSet<RecordId>>,
    pub foreign_sales: Mutex<Vec<SaleRecord>>,
    pub create_sale_delay: Mutex<Option<Duration>>,
    pub find_sales_calls: AtomicUsize,
    /// 1-based `find_sales` call from which loading fails.
    pub failing_find_sales_from: Mutex<Option<usize>>,
    pub failing_find_transactions: AtomicBool
}

impl FlakyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_payment(&self, payment_id: &str) {
        if let Ok(mut ids) = self.failing_payment_ids.lock() {
            ids.insert(payment_id.to_string());
        }
    }

    pub fn heal_payments(&self) {
        if let Ok(mut ids) = self.failing_payment_ids.lock() {
            ids.clear();
        }
    }

    pub fn fail_delete(&self, id: RecordId) {
        if let Ok(mut ids) = self.failing_deletes.lock() {
            ids.insert(id);
        }
    }

    pub fn heal_deletes(&self) {
        if let Ok(mut ids) = self.failing_deletes.lock() {
            ids.clear();
        }
    }

    pub fn fail_find_sales_from(&self, call: usize) {
        if let Ok(mut from) = self.failing_find_sales_from.lock() {
            *from = Some(call);
        }
    }

    fn delete_fails(&self, id: RecordId) -> bool {
        self.failing_deletes.lock().map(|ids| ids.contains(&id)).unwrap_or(false)
    }
}

#[async_trait]
impl LedgerStore for FlakyLedger {
    async fn find_sales(&self, user_id: &str, source: &str) -> StoreResult<Vec<SaleRecord>> {
        let call = self.find_sales_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fails = self.failing_find_sales_from.lock().ok().and_then(|from| *from).is_some_and(|from| call >= from);

        if fails {
            return Err(StoreError::Timeout(Duration::from_secs(10)));
        }

        let mut sales = self.inner.find_sales(user_id, source).await?;

        if let Ok(foreign) = self.foreign_sales.lock() {
            sales.extend(foreign.iter().cloned());
        }

        Ok(sales)
    }

    async fn create_sale(&self, sale: SaleRecord) -> StoreResult<SaleRecord> {
        let delay = self.create_sale_delay.lock().ok().and_then(|delay| *delay);

        if let Some(delay) = delay {
            sleep(delay).await;
        }

        self.inner.create_sale(sale).await
    }

    async fn merge_sale_metadata(&self, sale_id: RecordId, patch: &SaleMetadata) -> StoreResult<SaleRecord> {
        self.inner.merge_sale_metadata(sale_id, patch).await
    }

    async fn find_installments(&self, sale_id: RecordId) -> StoreResult<Vec<Installment>> {
        self.inner.find_installments(sale_id).await
    }

    async fn create_installment(&self, installment: Installment) -> StoreResult<Installment> {
        let fails = installment.external_payment_id.as_ref()
            .is_some_and(|id| self.failing_payment_ids.lock().map(|ids| ids.contains(id)).unwrap_or(false));

        if fails {
            return Err(StoreError::Backend("installment write rejected".to_string()));
        }

        self.inner.create_installment(installment).await
    }

    async fn find_attachments(&self, transaction_id: RecordId) -> StoreResult<Vec<Attachment>> {
        self.inner.find_attachments(transaction_id).await
    }

    async fn create_attachment(&self, attachment: Attachment) -> StoreResult<Attachment> {
        self.inner.create_attachment(attachment).await
    }

    async fn reassign_attachments(&self, from_transaction: RecordId, to_transaction: RecordId) -> StoreResult<usize> {
        self.inner.reassign_attachments(from_transaction, to_transaction).await
    }

    async fn find_transactions(&self, user_id: &str) -> StoreResult<Vec<Transaction>> {
        if self.failing_find_transactions.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("transaction listing rejected".to_string()));
        }

        self.inner.find_transactions(user_id).await
    }

    async fn transaction_exists(&self, transaction_id: RecordId) -> StoreResult<bool> {
        self.inner.transaction_exists(transaction_id).await
    }

    async fn create_transaction(&self, transaction: Transaction) -> StoreResult<Transaction> {
        self.inner.create_transaction(transaction).await
    }

    async fn delete_transaction(&self, transaction_id: RecordId) -> StoreResult<()> {
        if self.delete_fails(transaction_id) {
            return Err(StoreError::Backend("transaction delete rejected".to_string()));
        }

        self.inner.delete_transaction(transaction_id).await
    }

    async fn find_sale_link(&self, sale_id: RecordId) -> StoreResult<Option<SaleTransactionLink>> {
        self.inner.find_sale_link(sale_id).await
    }

    async fn create_sale_link(&self, link: SaleTransactionLink) -> StoreResult<SaleTransactionLink> {
        self.inner.create_sale_link(link).await
    }

    async fn relink_sales(&self, from_transaction: RecordId, to_transaction: RecordId) -> StoreResult<usize> {
        self.inner.relink_sales(from_transaction, to_transaction).await
    }

    async fn find_wallets(&self, user_id: &str) -> StoreResult<Vec<WalletWithCount>> {
        self.inner.find_wallets(user_id).await
    }

    async fn create_wallet(&self, wallet: Wallet) -> StoreResult<Wallet> {
        self.inner.create_wallet(wallet).await
    }

    async fn reassign_wallet_transactions(&self, from_wallet: RecordId, to_wallet: RecordId) -> StoreResult<usize> {
        if self.delete_fails(from_wallet) {
            return Err(StoreError::Backend("wallet reassignment rejected".to_string()));
        }

        self.inner.reassign_wallet_transactions(from_wallet, to_wallet).await
    }

    async fn delete_wallet(&self, wallet_id: RecordId) -> StoreResult<()> {
        if self.delete_fails(wallet_id) {
            return Err(StoreError::Backend("wallet delete rejected".to_string()));
        }

        self.inner.delete_wallet(wallet_id).await
    }
}
