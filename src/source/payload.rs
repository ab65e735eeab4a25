use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::warn;

use crate::identity::id_field;
use crate::source::errors::PayloadError;
use crate::types::{amount_or_zero, json_type_name, parse_date, ExternalId};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A sale from the sales source in canonical form.
///
/// Produced only by [`normalize_sale`]; the rest of the crate never looks at
/// raw key names.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalSale {
    /// Absent on legacy rows; such sales are always treated as new.
    pub external_id: Option<ExternalId>,
    pub code: String,
    pub date: Option<DateTime<Utc>>,
    pub total_amount: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub customer_name: String,
    pub store_name: String,
    pub payments: Vec<ExternalPayment>,
    pub attachments: Vec<ExternalAttachment>,
    /// Installment count announced without an explicit payment breakdown.
    pub installment_count: Option<u32>,
    pub interval_days: Option<u32>,
    pub first_installment_date: Option<DateTime<Utc>>,
    pub raw: Value
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalPayment {
    pub id: String,
    pub amount: Decimal,
    pub status: Option<String>,
    pub method: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub raw: Value
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalAttachment {
    pub id: String,
    pub name: String,
    pub url: String,
    pub mime_type: String,
    pub size: u64
}

/// Normalizes one raw sale payload.
///
/// Malformed numbers become zero and unparseable dates become `None`; only a
/// payload that is not an object is rejected.
pub fn normalize_sale(raw: &Value) -> Result<ExternalSale, PayloadError> {
    let Value::Object(object) = raw else {
        return Err(PayloadError::NotAnObject { found: json_type_name(raw).to_string() })
    };

    let external_id = id_field(object.get("id"));
    let total_amount = amount_or_zero(first_of(object, &["valor_total", "total", "valor"]), "valor_total");
    let net_amount = first_of(object, &["valor_liquido", "valor_total_liquido"])
        .map(|value| amount_or_zero(Some(value), "valor_liquido"))
        .unwrap_or(total_amount);

    let payments = collection(object, "pagamentos", "pagamento")
        .enumerate()
        .map(|(index, payment)| normalize_payment(index, payment))
        .collect();

    let attachments = collection(object, "anexos", "anexo")
        .enumerate()
        .map(|(index, attachment)| normalize_attachment(index, attachment))
        .collect();

    Ok(ExternalSale {
        code: text_of(object, &["codigo", "code"]).or_else(|| external_id.clone()).unwrap_or_default(),
        external_id,
        date: date_of(object, &["data", "data_venda", "date"]),
        total_amount,
        net_amount,
        status: text_of(object, &["nome_situacao", "situacao", "status"]).unwrap_or_default(),
        customer_name: name_of(object, &["nome_cliente", "cliente"]).unwrap_or_default(),
        store_name: name_of(object, &["nome_loja", "loja"]).unwrap_or_default(),
        payments,
        attachments,
        installment_count: count_of(object, &["numero_parcelas", "quantidade_parcelas"]),
        interval_days: number_of(object, &["intervalo_dias", "intervalo_parcelas"]),
        first_installment_date: date_of(object, &["data_primeira_parcela"]),
        raw: raw.clone()
    })
}

fn normalize_payment(index: usize, payment: &Map<String, Value>) -> ExternalPayment {
    ExternalPayment {
        id: id_field(payment.get("id")).unwrap_or_else(|| positional_id(index)),
        amount: amount_or_zero(first_of(payment, &["valor", "valor_parcela"]), "pagamento.valor"),
        status: text_of(payment, &["status", "nome_situacao", "situacao"]),
        method: text_of(payment, &["nome_forma_pagamento", "forma_pagamento"]),
        due_date: date_of(payment, &["data_vencimento", "vencimento", "data"]),
        raw: Value::Object(payment.clone())
    }
}

fn normalize_attachment(index: usize, attachment: &Map<String, Value>) -> ExternalAttachment {
    ExternalAttachment {
        id: id_field(attachment.get("id")).unwrap_or_else(|| positional_id(index)),
        name: text_of(attachment, &["nome", "nome_arquivo", "name"]).unwrap_or_else(|| format!("anexo-{}", index + 1)),
        url: text_of(attachment, &["url", "link", "caminho"]).unwrap_or_default(),
        mime_type: text_of(attachment, &["tipo", "mime_type", "content_type"]).unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
        size: count_of(attachment, &["tamanho", "size"]).map(u64::from).unwrap_or(0)
    }
}

/// Nested lists arrive either flat (`[{...}]`) or wrapped (`[{"pagamento": {...}}]`).
fn collection<'a>(object: &'a Map<String, Value>, field: &str, wrapper: &'a str) -> impl Iterator<Item = &'a Map<String, Value>> {
    let items = match object.get(field) {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Null) | None => &[],
        Some(other) => {
            warn!("Field [{field}] ignored, expected an array but found [{}]", json_type_name(other));
            &[]
        }
    };

    items.iter().filter_map(move |item| {
        let item = item.get(wrapper).unwrap_or(item);
        item.as_object()
    })
}

fn positional_id(index: usize) -> String {
    format!("idx-{}", index + 1)
}

fn first_of<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn text_of(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| id_field(object.get(*key)))
}

/// Names may come as plain strings or as nested objects carrying `nome`.
fn name_of(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key) {
        Some(Value::Object(nested)) => text_of(nested, &["nome", "name"]),
        other => id_field(other)
    })
}

fn date_of(object: &Map<String, Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .find_map(parse_date)
}

/// A non-negative whole number; zero is kept.
fn number_of(object: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    let number = match first_of(object, keys)? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None
    };

    number.and_then(|number| u32::try_from(number).ok())
}

fn count_of(object: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    number_of(object, keys).filter(|count| *count > 0)
}
