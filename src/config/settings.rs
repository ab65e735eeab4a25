use std::time::Duration;

/// Origin tag of records imported from Gestão Click.
pub const GESTAO_CLICK_SOURCE: &str = "gestao_click";

/// Tunables shared by the reconciler, the collapser and the sync cache.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Tag written to sale records and transactions created by the reconciler.
    pub source_tag: String,
    /// Deadline applied to every persistence and source call.
    pub call_timeout: Duration,
    /// Upper bound on detail entries kept in a report.
    pub max_details: usize,
    /// Spacing of synthesized installments when the source omits an interval.
    pub default_interval_days: u32,
    /// Most installments synthesized for one sale.
    pub max_installments: u32,
    pub cache_ttl: Duration,
    pub cache_capacity: u64
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_tag: GESTAO_CLICK_SOURCE.to_string(),
            call_timeout: Duration::from_secs(10),
            max_details: 100,
            default_interval_days: 30,
            max_installments: 360,
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1024
        }
    }
}

impl Settings {
    pub fn with_source_tag(mut self, source_tag: impl Into<String>) -> Self {
        self.source_tag = source_tag.into();
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_max_details(mut self, max_details: usize) -> Self {
        self.max_details = max_details;
        self
    }

    pub fn with_default_interval_days(mut self, days: u32) -> Self {
        self.default_interval_days = days.max(1);
        self
    }

    pub fn with_max_installments(mut self, max_installments: u32) -> Self {
        self.max_installments = max_installments;
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_cache_capacity(mut self, cache_capacity: u64) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }
}
