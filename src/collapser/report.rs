use serde::Serialize;

use crate::types::RecordId;

/// Outcome of one cleanup pass.
///
/// `kept` counts survivors of duplicate groups, `removed` counts records that
/// were merged away (or would be, in a dry run).
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub removed: usize,
    pub kept: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub details: Vec<CleanupDetail>,
    pub truncated: bool,
    #[serde(skip)]
    max_details: usize
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum CleanupDetail {
    Wallet {
        survivor_id: RecordId,
        survivor_name: String,
        removed_id: RecordId,
        removed_name: String,
        transactions_moved: usize,
        action: CleanupAction
    },
    Transaction {
        kept_id: RecordId,
        removed_id: RecordId,
        key: GroupingKey,
        attachments_moved: usize,
        action: CleanupAction
    }
}

/// Identity a transaction group was formed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GroupingKey {
    ExternalId(String),
    Fingerprint(String)
}

/// Terminal state of one duplicate. A failed merge leaves the duplicate in
/// place, so the next run detects the group again.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanupAction {
    WouldMerge,
    Merged,
    Failed {
        reason: String
    }
}

impl CleanupReport {
    pub fn new(max_details: usize, dry_run: bool) -> Self {
        Self {
            dry_run,
            max_details,
            ..Self::default()
        }
    }

    pub(super) fn keep(&mut self) {
        self.kept += 1;
    }

    pub(super) fn record(&mut self, detail: CleanupDetail) {
        let action = match &detail {
            CleanupDetail::Wallet { action, .. } | CleanupDetail::Transaction { action, .. } => action
        };

        match action {
            CleanupAction::WouldMerge | CleanupAction::Merged => self.removed += 1,
            CleanupAction::Failed { .. } => self.failed += 1
        }

        if self.details.len() < self.max_details {
            self.details.push(detail);
        } else {
            self.truncated = true;
        }
    }
}
