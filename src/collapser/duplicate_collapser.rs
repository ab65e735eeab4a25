use std::future::Future;
use std::sync::Arc;

use crate::config::Settings;
use crate::storage::{with_deadline, LedgerStore, StoreResult};

/// On-demand maintenance that merges duplicate wallets and transactions.
///
/// Every group is processed on its own: a failed merge is reported and the
/// run moves on. Running it again after a successful commit finds nothing.
pub struct DuplicateCollapser<S: LedgerStore> {
    pub(super) store: Arc<S>,
    pub(super) settings: Settings
}

impl<S: LedgerStore> DuplicateCollapser<S> {
    pub fn new(store: Arc<S>, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub(super) async fn call<T>(&self, call: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        with_deadline(self.settings.call_timeout, call).await
    }
}
