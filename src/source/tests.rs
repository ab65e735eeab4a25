use super::{normalize_sale, CachedSalesSource, FileSalesSource, PayloadError, SalesPage, SalesSource, SourceError};

use std::io::Write;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Datelike;
use rust_decimal::Decimal;
use serde_json::json;
use tempfile::NamedTempFile;
use tokio::time::sleep;

use crate::config::Settings;

struct CountingSource {
    calls: AtomicUsize
}

#[async_trait]
impl SalesSource for CountingSource {
    async fn fetch_page(&self, _user_id: &str, page: u32) -> Result<SalesPage, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        Ok(SalesPage {
            sales: vec![json!({"id": format!("{page}-{call}")})],
            has_more: false
        })
    }
}

fn counting_source() -> Arc<CountingSource> {
    Arc::new(CountingSource { calls: AtomicUsize::new(0) })
}

#[test]
fn test_normalize_reads_primary_keys() -> Result<()> {
    let sale = normalize_sale(&json!({
        "id": "500",
        "codigo": "V-500",
        "data": "2024-04-01",
        "valor_total": "300.00",
        "valor_liquido": "280,50",
        "nome_situacao": "Concretizada",
        "nome_cliente": "Maria",
        "nome_loja": "Matriz",
        "pagamentos": [
            {"pagamento": {"id": "p1", "valor": 150, "status": "Confirmado", "nome_forma_pagamento": "Pix", "data_vencimento": "2024-04-01"}},
            {"id": "p2", "valor": "150,00"}
        ],
        "anexos": [{"anexo": {"id": 9, "nome": "nota.pdf", "url": "https://files/nota.pdf", "tipo": "application/pdf", "tamanho": "2048"}}]
    }))?;

    assert_eq!(sale.external_id.as_deref(), Some("500"));
    assert_eq!(sale.code, "V-500");
    assert_eq!(sale.date.map(|date| date.day()), Some(1));
    assert_eq!(sale.total_amount, Decimal::from(300));
    assert_eq!(sale.net_amount, Decimal::from_str("280.50")?);
    assert_eq!(sale.customer_name, "Maria");
    assert_eq!(sale.store_name, "Matriz");

    assert_eq!(sale.payments.len(), 2);
    assert_eq!(sale.payments[0].id, "p1");
    assert_eq!(sale.payments[0].method.as_deref(), Some("Pix"));
    assert_eq!(sale.payments[1].amount, Decimal::from(150));

    assert_eq!(sale.attachments.len(), 1);
    assert_eq!(sale.attachments[0].id, "9");
    assert_eq!(sale.attachments[0].mime_type, "application/pdf");
    assert_eq!(sale.attachments[0].size, 2048);

    Ok(())
}

#[test]
fn test_normalize_applies_fallbacks_and_defaults() -> Result<()> {
    let sale = normalize_sale(&json!({
        "id": 501,
        "total": "abc",
        "cliente": {"nome": "João"},
        "numero_parcelas": "3",
        "intervalo_dias": 15,
        "pagamentos": [{"valor": "10"}],
        "anexos": "not-a-list"
    }))?;

    assert_eq!(sale.external_id.as_deref(), Some("501"));
    assert_eq!(sale.code, "501");
    assert_eq!(sale.date, None);
    assert_eq!(sale.total_amount, Decimal::ZERO);
    assert_eq!(sale.net_amount, Decimal::ZERO);
    assert_eq!(sale.customer_name, "João");
    assert_eq!(sale.installment_count, Some(3));
    assert_eq!(sale.interval_days, Some(15));
    assert_eq!(sale.payments[0].id, "idx-1");
    assert!(sale.attachments.is_empty());

    Ok(())
}

#[test]
fn test_normalize_treats_missing_id_as_legacy() -> Result<()> {
    let sale = normalize_sale(&json!({"id": null, "valor_total": 10, "numero_parcelas": 0}))?;

    assert_eq!(sale.external_id, None);
    assert_eq!(sale.installment_count, None);

    Ok(())
}

#[test]
fn test_normalize_keeps_a_zero_interval() -> Result<()> {
    let sale = normalize_sale(&json!({"id": "502", "numero_parcelas": 2, "intervalo_dias": "0"}))?;

    assert_eq!(sale.installment_count, Some(2));
    assert_eq!(sale.interval_days, Some(0));

    Ok(())
}

#[test]
fn test_normalize_rejects_non_objects() {
    assert!(matches!(normalize_sale(&json!([1, 2])), Err(PayloadError::NotAnObject { .. })));
    assert!(matches!(normalize_sale(&json!("500")), Err(PayloadError::NotAnObject { .. })));
}

#[tokio::test]
async fn test_file_source_pages_through_sales() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{}", json!({"data": [{"id": "1"}, {"id": "2"}, {"id": "3"}]}))?;

    let source = FileSalesSource::new(file.path()).with_page_size(2);

    let first = source.fetch_page("user-1", 1).await?;
    assert_eq!(first.sales.len(), 2);
    assert!(first.has_more);

    let second = source.fetch_page("user-1", 2).await?;
    assert_eq!(second.sales, vec![json!({"id": "3"})]);
    assert!(!second.has_more);

    Ok(())
}

#[tokio::test]
async fn test_file_source_reports_missing_and_invalid_files() -> Result<()> {
    let missing = FileSalesSource::new("does-not-exist.json");
    assert!(matches!(missing.fetch_page("user-1", 1).await, Err(SourceError::Unavailable(_))));

    let mut file = NamedTempFile::new()?;
    write!(file, "{{\"unexpected\": true}}")?;
    let invalid = FileSalesSource::new(file.path());
    assert!(matches!(invalid.fetch_page("user-1", 1).await, Err(SourceError::InvalidResponse(_))));

    Ok(())
}

#[tokio::test]
async fn test_cached_source_serves_repeated_pages_from_cache() -> Result<()> {
    let inner = counting_source();
    let cached = CachedSalesSource::new(inner.clone(), &Settings::default());

    let first = cached.fetch_page("user-1", 1).await?;
    let second = cached.fetch_page("user-1", 1).await?;

    assert_eq!(first.sales, second.sales);
    assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

    cached.fetch_page("user-2", 1).await?;
    assert_eq!(inner.calls.load(Ordering::SeqCst), 2);

    Ok(())
}

#[tokio::test]
async fn test_cached_source_invalidation_is_per_user() -> Result<()> {
    let inner = counting_source();
    let cached = CachedSalesSource::new(inner.clone(), &Settings::default());

    cached.fetch_page("user-1", 1).await?;
    cached.fetch_page("user-2", 1).await?;
    cached.invalidate_user("user-1");

    let refreshed = cached.fetch_page("user-1", 1).await?;
    cached.fetch_page("user-2", 1).await?;

    assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    assert_eq!(refreshed.sales.first().ok_or_else(|| anyhow!("empty page"))?["id"], json!("1-2"));

    Ok(())
}

#[tokio::test]
async fn test_cached_source_expires_after_ttl() -> Result<()> {
    let inner = counting_source();
    let settings = Settings::default().with_cache_ttl(Duration::from_millis(100));
    let cached = CachedSalesSource::new(inner.clone(), &settings);

    cached.fetch_page("user-1", 1).await?;
    sleep(Duration::from_millis(200)).await;
    cached.fetch_page("user-1", 1).await?;

    assert_eq!(inner.calls.load(Ordering::SeqCst), 2);

    Ok(())
}
