use serde::Serialize;

use crate::types::{ExternalId, RecordId};

/// Result of one import run, safe to hand back to an operator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
    pub details: Vec<ImportDetail>,
    /// More details happened than the report keeps.
    pub truncated: bool,
    /// Set when a sync stopped part-way, because the sales source or the ledger failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    #[serde(skip)]
    max_details: usize
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportDetail {
    pub external_id: Option<ExternalId>,
    pub sale_id: Option<RecordId>,
    #[serde(flatten)]
    pub outcome: ImportOutcome
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    Created {
        installments: usize,
        attachments: usize
    },
    Extended {
        installments: usize,
        attachments: usize
    },
    Skipped,
    Failed {
        reason: String
    }
}

impl ImportReport {
    pub fn new(max_details: usize) -> Self {
        Self {
            max_details,
            ..Self::default()
        }
    }

    pub fn record(&mut self, detail: ImportDetail) {
        match detail.outcome {
            ImportOutcome::Created { .. } | ImportOutcome::Extended { .. } => self.imported += 1,
            ImportOutcome::Skipped => self.skipped += 1,
            ImportOutcome::Failed { .. } => self.errors += 1
        }

        self.push_detail(detail);
    }

    /// Folds the report of a later page into this one.
    pub fn absorb(&mut self, other: ImportReport) {
        self.imported += other.imported;
        self.skipped += other.skipped;
        self.errors += other.errors;
        self.truncated |= other.truncated;

        for detail in other.details {
            self.push_detail(detail);
        }
    }

    fn push_detail(&mut self, detail: ImportDetail) {
        if self.details.len() < self.max_details {
            self.details.push(detail);
        } else {
            self.truncated = true;
        }
    }
}
