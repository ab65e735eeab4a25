use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Serializes ledger writers per user.
///
/// Imports and cleanups read existing records and write them back without
/// optimistic locking, so two runs for the same user must never overlap.
#[derive(Default)]
pub struct UserLocks {
    locks: DashMap<String, Arc<Mutex<()>>>
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other run holds the user's lock. The lock is released when the guard drops.
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        debug!("Waiting for ledger lock of user [{user_id}]");
        lock.lock_owned().await
    }
}
