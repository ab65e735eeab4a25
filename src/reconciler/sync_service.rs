use std::sync::Arc;

use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::Settings;
use crate::reconciler::{ImportError, ImportReport, SalesImporter};
use crate::source::{SalesSource, SourceError};
use crate::storage::{LedgerStore, UserLocks};

/// Pulls every page of a user's sales from the source and imports them.
pub struct SyncService<S: LedgerStore, R: SalesSource> {
    importer: SalesImporter<S>,
    source: Arc<R>,
    locks: Arc<UserLocks>,
    settings: Settings
}

impl<S: LedgerStore, R: SalesSource> SyncService<S, R> {
    pub fn new(store: Arc<S>, source: Arc<R>, locks: Arc<UserLocks>, settings: Settings) -> Self {
        Self {
            importer: SalesImporter::new(store, settings.clone()),
            source,
            locks,
            settings
        }
    }

    /// Imports pages in order while holding the user's ledger lock.
    ///
    /// A source failure stops paging and is reported in `source_error`;
    /// pages imported before it stay committed. The same holds when the
    /// ledger cannot be loaded for a later page.
    ///
    /// # Errors
    /// Returns `ImportError` when the first page cannot be imported at all,
    /// or when a sale record of another user is found.
    pub async fn sync_user(&self, user_id: &str) -> Result<ImportReport, ImportError> {
        let _guard = self.locks.acquire(user_id).await;
        let mut report = ImportReport::new(self.settings.max_details);
        let mut page = 1;

        loop {
            let fetched = timeout(self.settings.call_timeout, self.source.fetch_page(user_id, page))
                .await
                .unwrap_or(Err(SourceError::Timeout(self.settings.call_timeout)));

            let sales_page = match fetched {
                Ok(sales_page) => sales_page,
                Err(error) => {
                    warn!("Sync for user [{user_id}] stopped at page [{page}]: {error}");
                    report.source_error = Some(error.to_string());
                    break;
                }
            };

            match self.importer.import_sales(user_id, sales_page.sales).await {
                Ok(imported) => report.absorb(imported),
                Err(error @ ImportError::LoadFailed { .. }) if page > 1 => {
                    warn!("Sync for user [{user_id}] stopped at page [{page}]: {error}");
                    report.source_error = Some(error.to_string());
                    break;
                }
                Err(error) => return Err(error)
            }

            if !sales_page.has_more {
                break;
            }

            page += 1;
        }

        info!("Sync for user [{user_id}] read [{page}] page(s)");

        Ok(report)
    }
}
