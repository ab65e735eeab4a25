use std::sync::Arc;

use serde::Serialize;
use tokio::spawn;
use tracing::{info, warn};

use crate::admin::{AdminError, Notifier, Operator, TracingNotifier};
use crate::collapser::{CleanupReport, DuplicateCollapser};
use crate::config::Settings;
use crate::storage::{LedgerStore, UserLocks};

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceReport {
    pub wallets: CleanupReport,
    pub transactions: CleanupReport,
    /// Why the transaction pass did not run; wallet merges above still stand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
}

impl MaintenanceReport {
    pub fn summary(&self) -> String {
        let mode = if self.wallets.dry_run { "dry run" } else { "commit" };

        let summary = format!(
            "{mode}: wallets removed {} kept {} failed {}; transactions removed {} kept {} failed {}",
            self.wallets.removed, self.wallets.kept, self.wallets.failed,
            self.transactions.removed, self.transactions.kept, self.transactions.failed
        );

        match &self.error {
            Some(error) => format!("{summary}; transaction pass skipped: {error}"),
            None => summary
        }
    }
}

/// Admin-only duplicate cleanup of one user's ledger.
pub struct MaintenanceJob<S: LedgerStore> {
    collapser: DuplicateCollapser<S>,
    locks: Arc<UserLocks>,
    max_details: usize,
    notifier: Arc<dyn Notifier>
}

impl<S: LedgerStore> MaintenanceJob<S> {
    pub fn new(store: Arc<S>, locks: Arc<UserLocks>, settings: Settings) -> Self {
        Self {
            max_details: settings.max_details,
            collapser: DuplicateCollapser::new(store, settings),
            locks,
            notifier: Arc::new(TracingNotifier)
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Collapses duplicate wallets, then duplicate transactions, under the user's ledger lock.
    ///
    /// The operator is notified in the background once both passes finish; a
    /// failed notification is logged and never affects the result. When the
    /// transactions cannot be loaded after the wallet pass, the report keeps
    /// the wallet outcome and carries the failure in `error`.
    ///
    /// # Errors
    /// `AdminError::Forbidden` for non-admin operators, before anything is read.
    /// `AdminError::Cleanup` when the wallets cannot be loaded.
    pub async fn run(&self, operator: &Operator, user_id: &str, dry_run: bool) -> Result<MaintenanceReport, AdminError> {
        if !operator.is_admin() {
            warn!("Operator [{}] was refused maintenance of user [{user_id}]", operator.id);
            return Err(AdminError::forbidden(&operator.id));
        }

        let report = {
            let _guard = self.locks.acquire(user_id).await;

            let wallets = self.collapser.cleanup_duplicate_wallets(user_id, dry_run).await?;

            match self.collapser.cleanup_duplicate_transactions(user_id, dry_run).await {
                Ok(transactions) => MaintenanceReport { wallets, transactions, error: None },
                Err(error) => {
                    warn!("Transaction pass for user [{user_id}] skipped: {error}");

                    MaintenanceReport {
                        wallets,
                        transactions: CleanupReport::new(self.max_details, dry_run),
                        error: Some(error.to_string())
                    }
                }
            }
        };

        info!("Maintenance of user [{user_id}] by [{}] finished", operator.id);

        let notifier = self.notifier.clone();
        let operator_id = operator.id.clone();
        let summary = report.summary();

        spawn(async move {
            if let Err(error) = notifier.notify(&operator_id, &summary).await {
                warn!("{error}");
            }
        });

        Ok(report)
    }
}
