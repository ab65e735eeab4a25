use thiserror::Error;

use crate::collapser::CollapseError;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Operator [{operator_id}] is not allowed to run ledger maintenance")]
    Forbidden {
        operator_id: String
    },
    #[error(transparent)]
    Cleanup(#[from] CollapseError)
}

impl AdminError {
    pub fn forbidden(operator_id: &str) -> Self {
        Self::Forbidden { operator_id: operator_id.to_string() }
    }
}

#[derive(Debug, Error)]
#[error("Notification could not be delivered: {0}")]
pub struct NotifyError(pub String);
