use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::warn;

use crate::types::errors::AmountError;
use crate::types::json_type_name;

/// Parses a monetary value coming from the sales source.
///
/// The source sends amounts either as JSON numbers or as strings, and strings
/// may carry currency symbols and locale-specific separators (`"R$ 1.234,56"`,
/// `"1,234.56"`, `"300.00"`).
pub fn parse_amount(value: &Value) -> Result<Decimal, AmountError> {
    match value {
        Value::Number(number) => parse_amount_str(&number.to_string()),
        Value::String(text) => parse_amount_str(text),
        Value::Null => Err(AmountError::InvalidFormat("Value is null".to_string())),
        other => Err(AmountError::UnsupportedType(json_type_name(other).to_string()))
    }
}

/// Parses a textual amount, normalizing thousands and decimal separators.
///
/// When both `,` and `.` appear, the right-most one is the decimal separator.
/// A lone `,` is a decimal separator (Brazilian notation) unless it repeats.
/// A lone `.` is a decimal separator unless it repeats.
pub fn parse_amount_str(value: &str) -> Result<Decimal, AmountError> {
    let cleaned: String = value.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(AmountError::InvalidFormat(format!("Value [{value}] has no digits")));
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    let normalized = match (last_comma, last_dot) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() == 1 => cleaned.replace(',', "."),
        (Some(_), None) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned
    };

    Decimal::from_str(&normalized).map_err(|error| {
        AmountError::InvalidFormat(format!("Value [{value}] is not a number: {error}"))
    })
}

/// Lenient variant used while normalizing payloads: malformed amounts become zero.
pub fn amount_or_zero(value: Option<&Value>, field: &str) -> Decimal {
    let Some(value) = value else {
        return Decimal::ZERO
    };

    match parse_amount(value) {
        Ok(amount) => amount,
        Err(error) => {
            warn!("Field [{field}] defaulted to zero: {error}");
            Decimal::ZERO
        }
    }
}
