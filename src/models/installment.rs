use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::InstallmentStatus;
use crate::types::RecordId;

/// One payment tranche of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: RecordId,
    pub sale_id: RecordId,
    /// 1-based position within the sale.
    pub number: u32,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub status: InstallmentStatus,
    pub external_payment_id: Option<String>,
    pub metadata: InstallmentMetadata,
    pub created_at: DateTime<Utc>
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallmentMetadata {
    #[serde(default)]
    pub raw_source_payload: Option<Value>,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Generated by splitting the sale total rather than read from a payment.
    #[serde(default)]
    pub synthesized: bool
}
