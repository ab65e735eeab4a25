use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// A file reference taken from a sale, hosted by a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: RecordId,
    pub transaction_id: RecordId,
    pub sale_id: Option<RecordId>,
    pub external_id: Option<String>,
    pub name: String,
    pub url: String,
    pub mime_type: String,
    pub size: u64,
    pub created_at: DateTime<Utc>
}
