//! Cache facade over a key-value store
//!
//! Values are written under freshly generated UUID-v4 keys. Every `store`
//! call is counted, and when the backing store supports lists its inputs and
//! outputs are appended to the operation's history.

use std::num::ParseIntError;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::instrument::{count_calls, with_history, Operation};
use super::replay::BoundOperation;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::store::{RedisStore, Store, SupportsHistory, Value};

/// Stores values under generated keys and reads them back
///
/// Whether calls are recorded is fixed when the cache is built: [`Cache::new`]
/// records history, [`Cache::without_history`] only counts calls.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn Store>,
    history: Option<Arc<dyn SupportsHistory>>,
}

impl Cache {
    /// Creates a cache that counts calls and records their history
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: Store + SupportsHistory + 'static,
    {
        let history: Arc<dyn SupportsHistory> = store.clone();
        Self {
            store,
            history: Some(history),
        }
    }

    /// Creates a cache that counts calls but never records history
    pub fn without_history<S>(store: Arc<S>) -> Self
    where
        S: Store + 'static,
    {
        debug!("History recording disabled; replay will be empty");
        Self {
            store,
            history: None,
        }
    }

    /// Connects to Redis using `config` and builds a history-recording cache
    ///
    /// Clears the database first when `config.flush_on_start` is set.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let store = RedisStore::connect(&config.redis_url).await?;
        let cache = Self::new(Arc::new(store));
        if config.flush_on_start {
            cache.flush().await?;
        }
        Ok(cache)
    }

    /// Shared handle to the backing store, e.g. for a `PageCache`
    pub fn store_handle(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    /// Whether calls made through this cache are recorded
    pub fn records_history(&self) -> bool {
        self.history.is_some()
    }

    pub(crate) fn history_log(&self) -> Option<&dyn SupportsHistory> {
        self.history.as_deref()
    }

    /// Stores `value` under a new random key and returns the key
    ///
    /// Increments the `Cache.store` counter, then records the argument tuple,
    /// writes the value, and records the returned key.
    pub async fn store(&self, value: impl Into<Value>) -> Result<String> {
        let value = value.into();
        let name = Operation::Store.qualified_name();

        count_calls(self.store.as_ref(), name).await?;
        with_history(self.history_log(), name, value.args_repr(), || {
            self.write_value(&value)
        })
        .await
    }

    async fn write_value(&self, value: &Value) -> Result<String> {
        let key = Uuid::new_v4().to_string();
        self.store.set(&key, &value.to_bytes()).await?;
        debug!(key = %key, "Stored value");
        Ok(key)
    }

    /// Reads the raw bytes under `key`, `None` if absent
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store.get(key).await
    }

    /// Reads the bytes under `key` and converts them with `transform`
    ///
    /// Absent keys return `Ok(None)` without calling `transform`; a failing
    /// `transform` is returned as the error.
    pub async fn get_with<T, F>(&self, key: &str, transform: F) -> Result<Option<T>>
    where
        F: FnOnce(Vec<u8>) -> Result<T>,
    {
        self.get(key).await?.map(transform).transpose()
    }

    /// Reads the value under `key` as UTF-8 text
    pub async fn get_str(&self, key: &str) -> Result<Option<String>> {
        self.get_with(key, |bytes| Ok(String::from_utf8(bytes)?)).await
    }

    /// Reads the value under `key` as a decimal integer
    ///
    /// Surrounding whitespace, a leading `+` and single underscores between
    /// digits are accepted, as in `" 42\n"` or `"1_000"`.
    pub async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.get_with(key, |bytes| Ok(parse_int(&String::from_utf8(bytes)?)?))
            .await
    }

    /// Number of recorded calls to `op`, 0 if it was never called
    pub async fn call_count(&self, op: Operation) -> Result<i64> {
        let name = op.qualified_name();
        if !self.store.exists(name).await? {
            return Ok(0);
        }
        Ok(self.get_int(name).await?.unwrap_or(0))
    }

    /// Binds `op` to this cache for replaying its history
    pub fn bind(&self, op: Operation) -> BoundOperation<'_> {
        BoundOperation::new(self, op)
    }

    /// Removes every key in the backing store's database
    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }
}

fn parse_int(text: &str) -> std::result::Result<i64, ParseIntError> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let grouped = digits.contains('_')
        && !digits.starts_with('_')
        && !digits.ends_with('_')
        && !digits.contains("__");
    if grouped {
        trimmed.replace('_', "").parse()
    } else {
        // Misplaced underscores fail here as invalid digits
        trimmed.parse()
    }
}
