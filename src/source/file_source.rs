use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::source::{SalesPage, SalesSource, SourceError};

/// Serves sale payloads exported from the sales system to a JSON file.
///
/// The file holds either a bare array of sales or the API envelope
/// `{"data": [...]}`. The file is re-read on every page request.
pub struct FileSalesSource {
    path: PathBuf,
    page_size: usize
}

impl FileSalesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            page_size: 100
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[async_trait]
impl SalesSource for FileSalesSource {
    async fn fetch_page(&self, _user_id: &str, page: u32) -> Result<SalesPage, SourceError> {
        let path = self.path.clone();

        let contents = spawn_blocking(move || fs::read_to_string(&path))
            .await
            .map_err(|error| SourceError::Unavailable(format!("Reader task failed: {error}")))?
            .map_err(|error| SourceError::Unavailable(format!("Error opening sales at path: {} | {error}", self.path.display())))?;

        let document: Value = serde_json::from_str(&contents)
            .map_err(|error| SourceError::InvalidResponse(error.to_string()))?;

        let sales = match document {
            Value::Array(sales) => sales,
            Value::Object(mut envelope) => match envelope.remove("data") {
                Some(Value::Array(sales)) => sales,
                _ => return Err(SourceError::InvalidResponse("Envelope has no [data] array".to_string()))
            },
            _ => return Err(SourceError::InvalidResponse("Expected an array of sales".to_string()))
        };

        let start = (page.max(1) as usize - 1).saturating_mul(self.page_size);
        let has_more = sales.len() > start.saturating_add(self.page_size);
        let page_sales: Vec<Value> = sales.into_iter().skip(start).take(self.page_size).collect();

        debug!("Page [{page}] of [{}] served [{}] sales", self.path.display(), page_sales.len());

        Ok(SalesPage { sales: page_sales, has_more })
    }
}
