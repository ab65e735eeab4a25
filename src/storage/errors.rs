use std::time::Duration;

use thiserror::Error;

use crate::types::RecordId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} [{id}] was not found")]
    NotFound {
        entity: &'static str,
        id: RecordId
    },
    #[error("{entity} [{id}] is still referenced by {references} record(s)")]
    StillReferenced {
        entity: &'static str,
        id: RecordId,
        references: usize
    },
    #[error("Store call exceeded its deadline of {0:?}")]
    Timeout(Duration),
    #[error("Store backend failure: {0}")]
    Backend(String)
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: RecordId) -> Self {
        Self::NotFound { entity, id }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
