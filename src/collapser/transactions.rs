use std::cmp::Reverse;

use tracing::{debug, info, warn};

use crate::collapser::{CleanupAction, CleanupDetail, CleanupReport, CollapseError, DuplicateCollapser, GroupingKey};
use crate::identity::{group_in_order, recover_external_id, transaction_fingerprint};
use crate::models::Transaction;
use crate::storage::{LedgerStore, StoreError};

impl<S: LedgerStore> DuplicateCollapser<S> {
    /// Removes duplicate transactions that came from the sales source.
    ///
    /// Pass one groups transactions by the external id recovered from their
    /// metadata. Transactions without one fall through to pass two, which
    /// groups them by fingerprint (wallet, day, amount, name). In both passes
    /// the most recently created transaction survives and inherits the
    /// attachments and sale links of the ones removed.
    ///
    /// # Errors
    /// Returns `CollapseError` only when the transactions cannot be loaded.
    pub async fn cleanup_duplicate_transactions(&self, user_id: &str, dry_run: bool) -> Result<CleanupReport, CollapseError> {
        let transactions = self.call(self.store.find_transactions(user_id)).await
            .map_err(CollapseError::load_failed(user_id, "Transactions"))?;

        let mut identified = Vec::new();
        let mut anonymous = Vec::new();

        for transaction in transactions.into_iter().filter(|transaction| transaction.is_from_source(&self.settings.source_tag)) {
            match recover_external_id(&transaction.metadata) {
                Some(external_id) => identified.push((GroupingKey::ExternalId(external_id), transaction)),
                None => anonymous.push((GroupingKey::Fingerprint(transaction_fingerprint(&transaction)), transaction))
            }
        }

        let mut report = CleanupReport::new(self.settings.max_details, dry_run);

        let by_external_id = group_in_order(identified, |(key, _)| key.clone());
        let by_fingerprint = group_in_order(anonymous, |(key, _)| key.clone());

        for (key, group) in by_external_id.into_iter().chain(by_fingerprint) {
            if group.len() > 1 {
                let members = group.into_iter().map(|(_, transaction)| transaction).collect();
                self.collapse_group(key, members, dry_run, &mut report).await;
            }
        }

        info!(
            "Transaction cleanup for user [{user_id}] (dry run: {dry_run}): removed [{}] kept [{}] failed [{}]",
            report.removed, report.kept, report.failed
        );

        Ok(report)
    }

    async fn collapse_group(&self, key: GroupingKey, mut group: Vec<Transaction>, dry_run: bool, report: &mut CleanupReport) {
        group.sort_by_key(|transaction| Reverse(transaction.created_at));

        let mut members = group.into_iter();
        let Some(survivor) = members.next() else {
            return
        };

        debug!("Transaction group [{key:?}] keeps [{}] over {} duplicate(s)", survivor.id, members.len());
        report.keep();

        for duplicate in members {
            let (attachments_moved, action) = if dry_run {
                (0, CleanupAction::WouldMerge)
            } else {
                match self.merge_transaction(&survivor, &duplicate).await {
                    Ok(moved) => (moved, CleanupAction::Merged),
                    Err(error) => {
                        warn!("Transaction [{}] could not be removed in favour of [{}]: {error}", duplicate.id, survivor.id);
                        (0, CleanupAction::Failed { reason: error.to_string() })
                    }
                }
            };

            report.record(CleanupDetail::Transaction {
                kept_id: survivor.id,
                removed_id: duplicate.id,
                key: key.clone(),
                attachments_moved,
                action
            });
        }
    }

    async fn merge_transaction(&self, survivor: &Transaction, duplicate: &Transaction) -> Result<usize, StoreError> {
        let moved = self.call(self.store.reassign_attachments(duplicate.id, survivor.id)).await?;
        self.call(self.store.relink_sales(duplicate.id, survivor.id)).await?;
        self.call(self.store.delete_transaction(duplicate.id)).await?;

        Ok(moved)
    }
}
