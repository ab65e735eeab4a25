mod amount;
mod dates;
mod errors;

use serde_json::Value;
use uuid::Uuid;

pub use amount::{amount_or_zero, parse_amount, parse_amount_str};
pub use dates::parse_date;
pub use errors::AmountError;

pub type UserId = String;
pub type RecordId = Uuid;
pub type ExternalId = String;

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object"
    }
}
