use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use tracing::debug;

use crate::config::Settings;
use crate::source::{SalesPage, SalesSource, SourceError};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct PageKey {
    user_id: String,
    generation: u64,
    page: u32
}

/// Sync cache in front of a [`SalesSource`].
///
/// Pages live for the configured TTL. `invalidate_user` bumps the user's
/// generation so every cached page of that user becomes unreachable at once.
pub struct CachedSalesSource<S: SalesSource> {
    inner: Arc<S>,
    cache: Cache<PageKey, SalesPage>,
    generations: DashMap<String, u64>
}

impl<S: SalesSource> CachedSalesSource<S> {
    pub fn new(inner: Arc<S>, settings: &Settings) -> Self {
        let cache = Cache::builder()
            .max_capacity(settings.cache_capacity)
            .time_to_live(settings.cache_ttl)
            .build();

        Self {
            inner,
            cache,
            generations: DashMap::new()
        }
    }

    pub fn invalidate_user(&self, user_id: &str) {
        *self.generations.entry(user_id.to_string()).or_insert(0) += 1;
        debug!("Sync cache invalidated for user [{user_id}]");
    }

    fn key(&self, user_id: &str, page: u32) -> PageKey {
        let generation = self.generations.get(user_id).map(|entry| *entry).unwrap_or(0);

        PageKey {
            user_id: user_id.to_string(),
            generation,
            page
        }
    }
}

#[async_trait]
impl<S: SalesSource> SalesSource for CachedSalesSource<S> {
    async fn fetch_page(&self, user_id: &str, page: u32) -> Result<SalesPage, SourceError> {
        let key = self.key(user_id, page);

        self.cache
            .try_get_with(key, self.inner.fetch_page(user_id, page))
            .await
            .map_err(|error| (*error).clone())
    }
}
