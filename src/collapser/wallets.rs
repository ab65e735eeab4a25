use std::cmp::Reverse;

use tracing::{debug, info, warn};

use crate::collapser::{CleanupAction, CleanupDetail, CleanupReport, CollapseError, DuplicateCollapser};
use crate::identity::{group_in_order, normalize_wallet_name};
use crate::models::WalletWithCount;
use crate::storage::{LedgerStore, StoreError};

impl<S: LedgerStore> DuplicateCollapser<S> {
    /// Merges externally-synced wallets that share type and normalized name.
    ///
    /// The survivor of a group is the wallet with most transactions, then the
    /// most recently created; remaining ties keep store order. Duplicates hand
    /// their transactions to the survivor and are then deleted.
    ///
    /// # Errors
    /// Returns `CollapseError` only when the wallets cannot be loaded.
    pub async fn cleanup_duplicate_wallets(&self, user_id: &str, dry_run: bool) -> Result<CleanupReport, CollapseError> {
        let wallets = self.call(self.store.find_wallets(user_id)).await
            .map_err(CollapseError::load_failed(user_id, "Wallets"))?;

        let synced = wallets.into_iter()
            .filter(|item| item.wallet.user_id == user_id && item.wallet.wallet_type.is_externally_synced());

        let groups = group_in_order(synced, |item| (item.wallet.wallet_type, normalize_wallet_name(&item.wallet.name)));
        let mut report = CleanupReport::new(self.settings.max_details, dry_run);

        for ((_, name), mut group) in groups.into_iter().filter(|(_, group)| group.len() > 1) {
            group.sort_by_key(|item| Reverse((item.transaction_count, item.wallet.created_at)));

            let mut members = group.into_iter();
            let Some(survivor) = members.next() else {
                continue
            };

            debug!("Wallet group [{name}] keeps [{}] over {} duplicate(s)", survivor.wallet.id, members.len());
            report.keep();

            for duplicate in members {
                let (transactions_moved, action) = if dry_run {
                    (duplicate.transaction_count, CleanupAction::WouldMerge)
                } else {
                    match self.merge_wallet(&survivor, &duplicate).await {
                        Ok(moved) => (moved, CleanupAction::Merged),
                        Err(error) => {
                            warn!("Wallet [{}] could not be merged into [{}]: {error}", duplicate.wallet.id, survivor.wallet.id);
                            (0, CleanupAction::Failed { reason: error.to_string() })
                        }
                    }
                };

                report.record(CleanupDetail::Wallet {
                    survivor_id: survivor.wallet.id,
                    survivor_name: survivor.wallet.name.clone(),
                    removed_id: duplicate.wallet.id,
                    removed_name: duplicate.wallet.name.clone(),
                    transactions_moved,
                    action
                });
            }
        }

        info!(
            "Wallet cleanup for user [{user_id}] (dry run: {dry_run}): removed [{}] kept [{}] failed [{}]",
            report.removed, report.kept, report.failed
        );

        Ok(report)
    }

    async fn merge_wallet(&self, survivor: &WalletWithCount, duplicate: &WalletWithCount) -> Result<usize, StoreError> {
        let moved = self.call(self.store.reassign_wallet_transactions(duplicate.wallet.id, survivor.wallet.id)).await?;
        self.call(self.store.delete_wallet(duplicate.wallet.id)).await?;

        Ok(moved)
    }
}
