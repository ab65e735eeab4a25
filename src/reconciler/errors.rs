use thiserror::Error;

use crate::source::PayloadError;
use crate::storage::StoreError;
use crate::types::{RecordId, UserId};

/// Failures that abort a whole import request.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Sale record [{sale_id}] belongs to user [{owner}], not to [{user_id}]")]
    Unauthorized {
        user_id: UserId,
        owner: UserId,
        sale_id: RecordId
    },
    #[error("Existing sale records of user [{user_id}] could not be loaded: {source}")]
    LoadFailed {
        user_id: UserId,
        #[source]
        source: StoreError
    }
}

/// Failures isolated to a single sale; the batch carries on.
#[derive(Debug, Error)]
pub enum SaleError {
    #[error("{0}")]
    Payload(#[from] PayloadError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("Sale announces [{count}] installments, more than the limit of [{limit}]")]
    TooManyInstallments {
        count: u32,
        limit: u32
    },
    #[error("Installment [{number}] would fall due outside the supported date range")]
    DueDateOutOfRange {
        number: u32
    }
}
