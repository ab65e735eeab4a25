use crate::models::Transaction;

/// Fallback identity for transactions without a recoverable external id:
/// `wallet|day|amount|name`.
///
/// The amount is normalized so `50` and `50.00` collide. The name is compared
/// verbatim, so same-day purchases with identical description and amount on
/// the same wallet are indistinguishable.
pub fn transaction_fingerprint(transaction: &Transaction) -> String {
    let wallet = transaction.wallet_id
        .map(|wallet_id| wallet_id.to_string())
        .unwrap_or_else(|| "none".to_string());

    format!(
        "{}|{}|{}|{}",
        wallet,
        transaction.date.format("%Y-%m-%d"),
        transaction.amount.normalize(),
        transaction.name
    )
}

pub fn normalize_wallet_name(name: &str) -> String {
    name.trim().to_lowercase()
}
