use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::models::{Attachment, Installment, SaleMetadata, SaleRecord, SaleTransactionLink, Transaction, Wallet, WalletWithCount};
use crate::storage::{LedgerSnapshot, LedgerStore, StoreError, StoreResult};
use crate::types::RecordId;

/// Entity totals, used to check that a run left the ledger untouched.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct LedgerCounts {
    pub sales: usize,
    pub installments: usize,
    pub attachments: usize,
    pub transactions: usize,
    pub wallets: usize,
    pub links: usize
}

/// In-process ledger backed by concurrent maps, one per collection.
#[derive(Default)]
pub struct MemoryLedger {
    sales: DashMap<RecordId, SaleRecord>,
    installments: DashMap<RecordId, Installment>,
    attachments: DashMap<RecordId, Attachment>,
    transactions: DashMap<RecordId, Transaction>,
    wallets: DashMap<RecordId, Wallet>,
    links: DashMap<RecordId, SaleTransactionLink>
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let ledger = Self::new();

        for sale in snapshot.sales {
            ledger.sales.insert(sale.id, sale);
        }
        for installment in snapshot.installments {
            ledger.installments.insert(installment.id, installment);
        }
        for attachment in snapshot.attachments {
            ledger.attachments.insert(attachment.id, attachment);
        }
        for transaction in snapshot.transactions {
            ledger.transactions.insert(transaction.id, transaction);
        }
        for wallet in snapshot.wallets {
            ledger.wallets.insert(wallet.id, wallet);
        }
        for link in snapshot.links {
            ledger.links.insert(link.id, link);
        }

        ledger
    }

    /// Copies every collection, each ordered by creation time then id.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut sales = values(&self.sales);
        sales.sort_by_key(|sale| (sale.created_at, sale.id));

        let mut installments = values(&self.installments);
        installments.sort_by_key(|installment| (installment.created_at, installment.id));

        let mut attachments = values(&self.attachments);
        attachments.sort_by_key(|attachment| (attachment.created_at, attachment.id));

        let mut transactions = values(&self.transactions);
        transactions.sort_by_key(|transaction| (transaction.created_at, transaction.id));

        let mut wallets = values(&self.wallets);
        wallets.sort_by_key(|wallet| (wallet.created_at, wallet.id));

        let mut links = values(&self.links);
        links.sort_by_key(|link| (link.created_at, link.id));

        LedgerSnapshot { sales, installments, attachments, transactions, wallets, links }
    }

    pub fn counts(&self) -> LedgerCounts {
        LedgerCounts {
            sales: self.sales.len(),
            installments: self.installments.len(),
            attachments: self.attachments.len(),
            transactions: self.transactions.len(),
            wallets: self.wallets.len(),
            links: self.links.len()
        }
    }
}

fn values<T: Clone>(map: &DashMap<RecordId, T>) -> Vec<T> {
    map.iter().map(|item| item.value().clone()).collect()
}

fn filtered<T: Clone>(map: &DashMap<RecordId, T>, predicate: impl Fn(&T) -> bool) -> Vec<T> {
    map.iter()
        .filter(|item| predicate(item.value()))
        .map(|item| item.value().clone())
        .collect()
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn find_sales(&self, user_id: &str, source: &str) -> StoreResult<Vec<SaleRecord>> {
        let mut sales = filtered(&self.sales, |sale| sale.user_id == user_id && sale.source == source);
        sales.sort_by_key(|sale| (sale.created_at, sale.id));
        Ok(sales)
    }

    async fn create_sale(&self, sale: SaleRecord) -> StoreResult<SaleRecord> {
        self.sales.insert(sale.id, sale.clone());
        Ok(sale)
    }

    async fn merge_sale_metadata(&self, sale_id: RecordId, patch: &SaleMetadata) -> StoreResult<SaleRecord> {
        let mut sale = self.sales.get_mut(&sale_id)
            .ok_or_else(|| StoreError::not_found("Sale record", sale_id))?;

        sale.metadata.merge(patch);
        sale.updated_at = Utc::now();

        Ok(sale.value().clone())
    }

    async fn find_installments(&self, sale_id: RecordId) -> StoreResult<Vec<Installment>> {
        let mut installments = filtered(&self.installments, |installment| installment.sale_id == sale_id);
        installments.sort_by_key(|installment| (installment.number, installment.created_at));
        Ok(installments)
    }

    async fn create_installment(&self, installment: Installment) -> StoreResult<Installment> {
        if !self.sales.contains_key(&installment.sale_id) {
            return Err(StoreError::not_found("Sale record", installment.sale_id));
        }

        self.installments.insert(installment.id, installment.clone());
        Ok(installment)
    }

    async fn find_attachments(&self, transaction_id: RecordId) -> StoreResult<Vec<Attachment>> {
        let mut attachments = filtered(&self.attachments, |attachment| attachment.transaction_id == transaction_id);
        attachments.sort_by_key(|attachment| (attachment.created_at, attachment.id));
        Ok(attachments)
    }

    async fn create_attachment(&self, attachment: Attachment) -> StoreResult<Attachment> {
        if !self.transactions.contains_key(&attachment.transaction_id) {
            return Err(StoreError::not_found("Transaction", attachment.transaction_id));
        }

        self.attachments.insert(attachment.id, attachment.clone());
        Ok(attachment)
    }

    async fn reassign_attachments(&self, from_transaction: RecordId, to_transaction: RecordId) -> StoreResult<usize> {
        let mut moved = 0;

        for mut attachment in self.attachments.iter_mut() {
            if attachment.transaction_id == from_transaction {
                attachment.transaction_id = to_transaction;
                moved += 1;
            }
        }

        Ok(moved)
    }

    async fn find_transactions(&self, user_id: &str) -> StoreResult<Vec<Transaction>> {
        let mut transactions = filtered(&self.transactions, |transaction| transaction.user_id == user_id);
        transactions.sort_by_key(|transaction| (transaction.created_at, transaction.id));
        Ok(transactions)
    }

    async fn transaction_exists(&self, transaction_id: RecordId) -> StoreResult<bool> {
        Ok(self.transactions.contains_key(&transaction_id))
    }

    async fn create_transaction(&self, transaction: Transaction) -> StoreResult<Transaction> {
        self.transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn delete_transaction(&self, transaction_id: RecordId) -> StoreResult<()> {
        let references = self.attachments.iter()
            .filter(|attachment| attachment.transaction_id == transaction_id)
            .count();

        if references > 0 {
            return Err(StoreError::StillReferenced { entity: "Transaction", id: transaction_id, references });
        }

        self.transactions.remove(&transaction_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Transaction", transaction_id))
    }

    async fn find_sale_link(&self, sale_id: RecordId) -> StoreResult<Option<SaleTransactionLink>> {
        let mut links = filtered(&self.links, |link| link.sale_id == sale_id);
        links.sort_by_key(|link| (link.created_at, link.id));
        Ok(links.into_iter().next())
    }

    async fn create_sale_link(&self, link: SaleTransactionLink) -> StoreResult<SaleTransactionLink> {
        self.links.insert(link.id, link.clone());
        Ok(link)
    }

    async fn relink_sales(&self, from_transaction: RecordId, to_transaction: RecordId) -> StoreResult<usize> {
        let mut moved = 0;

        for mut link in self.links.iter_mut() {
            if link.transaction_id == from_transaction {
                link.transaction_id = to_transaction;
                moved += 1;
            }
        }

        Ok(moved)
    }

    async fn find_wallets(&self, user_id: &str) -> StoreResult<Vec<WalletWithCount>> {
        let mut wallets: Vec<WalletWithCount> = filtered(&self.wallets, |wallet| wallet.user_id == user_id)
            .into_iter()
            .map(|wallet| {
                let transaction_count = self.transactions.iter()
                    .filter(|transaction| transaction.wallet_id == Some(wallet.id))
                    .count();

                WalletWithCount { wallet, transaction_count }
            })
            .collect();

        wallets.sort_by_key(|item| (item.wallet.created_at, item.wallet.id));
        Ok(wallets)
    }

    async fn create_wallet(&self, wallet: Wallet) -> StoreResult<Wallet> {
        self.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn reassign_wallet_transactions(&self, from_wallet: RecordId, to_wallet: RecordId) -> StoreResult<usize> {
        if !self.wallets.contains_key(&to_wallet) {
            return Err(StoreError::not_found("Wallet", to_wallet));
        }

        let mut moved = 0;

        for mut transaction in self.transactions.iter_mut() {
            if transaction.wallet_id == Some(from_wallet) {
                transaction.wallet_id = Some(to_wallet);
                moved += 1;
            }
        }

        Ok(moved)
    }

    async fn delete_wallet(&self, wallet_id: RecordId) -> StoreResult<()> {
        let references = self.transactions.iter()
            .filter(|transaction| transaction.wallet_id == Some(wallet_id))
            .count();

        if references > 0 {
            return Err(StoreError::StillReferenced { entity: "Wallet", id: wallet_id, references });
        }

        self.wallets.remove(&wallet_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Wallet", wallet_id))
    }
}
