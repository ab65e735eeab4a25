use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{TransactionStatus, TransactionType};
use crate::types::{RecordId, UserId};

/// A general ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    pub user_id: UserId,
    pub name: String,
    /// Signed amount: expenses are negative.
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub wallet_id: Option<RecordId>,
    pub metadata: TransactionMetadata,
    pub created_at: DateTime<Utc>
}

/// Source-specific payload attached to a transaction.
///
/// The three id fields are the places where an external identity has been
/// recorded over time; see `identity::recover_external_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub original_id: Option<String>,
    #[serde(default)]
    pub source_data: Option<Value>,
    /// The transaction only exists to host attachments of a sale.
    #[serde(default)]
    pub attachment_only: bool,
    #[serde(default)]
    pub sale_id: Option<RecordId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>
}

impl Transaction {
    pub fn is_from_source(&self, source: &str) -> bool {
        self.metadata.source.as_deref() == Some(source)
    }
}
