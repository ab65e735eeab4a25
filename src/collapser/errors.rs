use thiserror::Error;

use crate::storage::StoreError;
use crate::types::UserId;

#[derive(Debug, Error)]
pub enum CollapseError {
    #[error("{entity} of user [{user_id}] could not be loaded: {source}")]
    LoadFailed {
        user_id: UserId,
        entity: &'static str,
        #[source]
        source: StoreError
    }
}

impl CollapseError {
    pub fn load_failed(user_id: &str, entity: &'static str) -> impl FnOnce(StoreError) -> Self {
        let user_id = user_id.to_string();
        move |source| Self::LoadFailed { user_id, entity, source }
    }
}
