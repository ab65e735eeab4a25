use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::WalletType;
use crate::types::{RecordId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: RecordId,
    pub user_id: UserId,
    pub name: String,
    #[serde(rename = "type")]
    pub wallet_type: WalletType,
    pub created_at: DateTime<Utc>
}

/// A wallet together with the number of transactions that reference it.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletWithCount {
    pub wallet: Wallet,
    pub transaction_count: usize
}
