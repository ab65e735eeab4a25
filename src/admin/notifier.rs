use async_trait::async_trait;
use tracing::info;

use crate::admin::NotifyError;

/// Delivers the summary of a finished maintenance run to its operator.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, operator_id: &str, summary: &str) -> Result<(), NotifyError>;
}

/// Writes the summary to the log.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, operator_id: &str, summary: &str) -> Result<(), NotifyError> {
        info!("Maintenance summary for operator [{operator_id}]: {summary}");
        Ok(())
    }
}
