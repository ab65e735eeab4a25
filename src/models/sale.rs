use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ExternalId, RecordId, UserId};

/// Ledger-side representation of one sale imported from the sales source.
///
/// At most one record exists per `(user_id, source, external_id)`. The
/// reconciler creates it on first sighting and afterwards only merges
/// metadata into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: RecordId,
    pub user_id: UserId,
    /// Identifier assigned by the source. Legacy rows may not have one.
    pub external_id: Option<ExternalId>,
    pub code: String,
    pub date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub customer_name: String,
    pub store_name: String,
    /// Tag of the origin system.
    pub source: String,
    pub metadata: SaleMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

/// Processing state accumulated across syncs of the same external sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleMetadata {
    /// Payment ids already materialized as installments.
    #[serde(default)]
    pub processed_payment_ids: BTreeSet<String>,
    /// Attachment ids already materialized as attachments.
    #[serde(default)]
    pub processed_attachment_ids: BTreeSet<String>,
    /// Number of installments generated from an installment count.
    #[serde(default)]
    pub synthesized_installments: u32,
    /// Last payload seen from the source for this sale.
    #[serde(default)]
    pub raw_source_payload: Option<Value>,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>
}

impl SaleMetadata {
    /// Splices `patch` into the current metadata.
    ///
    /// Processed-id sets only ever grow; scalar fields take the patch value
    /// when the patch carries one.
    pub fn merge(&mut self, patch: &SaleMetadata) {
        self.processed_payment_ids.extend(patch.processed_payment_ids.iter().cloned());
        self.processed_attachment_ids.extend(patch.processed_attachment_ids.iter().cloned());
        self.synthesized_installments = self.synthesized_installments.max(patch.synthesized_installments);

        if patch.raw_source_payload.is_some() {
            self.raw_source_payload.clone_from(&patch.raw_source_payload);
        }

        if patch.last_synced_at.is_some() {
            self.last_synced_at = patch.last_synced_at;
        }
    }
}

/// Links a sale to the transaction that hosts its attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleTransactionLink {
    pub id: RecordId,
    pub sale_id: RecordId,
    pub transaction_id: RecordId,
    pub created_at: DateTime<Utc>
}
