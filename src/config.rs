//! Connection and expiry settings
//!
//! Defaults match a local Redis on its standard port and a 10 second page
//! expiry. `StoreConfig::from_env` lets the environment override both.

use std::time::Duration;

use tracing::warn;

/// Default Redis connection URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";

/// How long a fetched page stays cached
pub const DEFAULT_PAGE_TTL: Duration = Duration::from_secs(10);

/// Environment variable holding the Redis URL
pub const REDIS_URL_ENV: &str = "REDIS_URL";

/// Environment variable holding the page expiry in seconds
pub const PAGE_TTL_ENV: &str = "PAGE_CACHE_TTL_SECS";

/// Settings for connecting to the store and caching pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Expiry applied to cached pages
    pub page_ttl: Duration,
    /// Whether `Cache::connect` clears the database before use
    pub flush_on_start: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            page_ttl: DEFAULT_PAGE_TTL,
            flush_on_start: true,
        }
    }
}

impl StoreConfig {
    /// Builds a config from `REDIS_URL` and `PAGE_CACHE_TTL_SECS`, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(REDIS_URL_ENV).filter(|url| !url.trim().is_empty()) {
            config.redis_url = url;
        }

        if let Some(raw) = lookup(PAGE_TTL_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.page_ttl = Duration::from_secs(secs),
                _ => warn!(value = %raw, "Ignoring invalid {}", PAGE_TTL_ENV),
            }
        }

        config
    }

    /// Overrides the Redis URL
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Overrides the page expiry
    pub fn with_page_ttl(mut self, ttl: Duration) -> Self {
        self.page_ttl = ttl;
        self
    }

    /// Sets whether the database is cleared on connect
    pub fn with_flush_on_start(mut self, flush: bool) -> Self {
        self.flush_on_start = flush;
        self
    }
}
