mod cached_source;
mod errors;
mod file_source;
mod payload;
#[cfg(test)]
mod tests;

use async_trait::async_trait;
use serde_json::Value;

pub use cached_source::CachedSalesSource;
pub use errors::{PayloadError, SourceError};
pub use file_source::FileSalesSource;
pub use payload::{normalize_sale, ExternalAttachment, ExternalPayment, ExternalSale};

/// One page of raw sale payloads returned by the sales source.
#[derive(Debug, Clone, Default)]
pub struct SalesPage {
    pub sales: Vec<Value>,
    pub has_more: bool
}

/// Read side of the external sales system. Pages are 1-based.
#[async_trait]
pub trait SalesSource: Send + Sync + 'static {
    async fn fetch_page(&self, user_id: &str, page: u32) -> Result<SalesPage, SourceError>;
}
