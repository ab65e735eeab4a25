mod fingerprint;

use std::collections::HashMap;
use std::hash::Hash;

use serde_json::Value;

use crate::models::TransactionMetadata;
use crate::types::ExternalId;

pub use fingerprint::{normalize_wallet_name, transaction_fingerprint};

/// Recovers the external identity of a transaction from its metadata.
///
/// Checked in order: the source-provided external id, the original record id,
/// then `source_data.id`. Blank values are ignored.
pub fn recover_external_id(metadata: &TransactionMetadata) -> Option<ExternalId> {
    non_blank(metadata.external_id.as_deref())
        .or_else(|| non_blank(metadata.original_id.as_deref()))
        .or_else(|| metadata.source_data.as_ref().and_then(|data| id_field(data.get("id"))))
}

/// Reads an identifier that may be a JSON string or number.
pub fn id_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => non_blank(Some(text.as_str())),
        Value::Number(number) => Some(number.to_string()),
        _ => None
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Groups items by key, keeping groups in the order their first member was seen
/// and members in input order.
pub fn group_in_order<K, T, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K
{
    let mut positions = HashMap::<K, usize>::new();
    let mut groups = Vec::<(K, Vec<T>)>::new();

    for item in items {
        let item_key = key(&item);

        match positions.get(&item_key) {
            Some(&position) => groups[position].1.push(item),
            None => {
                positions.insert(item_key.clone(), groups.len());
                groups.push((item_key, vec![item]));
            }
        }
    }

    groups
}
