//! Key-value store collaborators
//!
//! The cache facade and the page cache only talk to the store through the
//! [`Store`] trait. List commands live in a separate [`SupportsHistory`]
//! trait so a cache can be built without history recording.

mod memory;
mod redis_store;
mod value;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;
pub use self::value::Value;
pub(crate) use self::value::quote_bytes;

/// Single-key commands the caches rely on
///
/// Each method maps to one store command, so each call is atomic on its own.
#[async_trait]
pub trait Store: Send + Sync {
    /// Writes `value` under `key`, replacing any previous value and expiry
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Reads the bytes under `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Adds `delta` to the integer under `key`, treating an absent key as 0
    async fn incr(&self, key: &str, delta: i64) -> Result<i64>;

    /// Whether `key` currently holds a value
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Writes `value` under `key` and expires it after `ttl`
    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Removes every key in the current database
    async fn flush(&self) -> Result<()>;
}

/// List commands used to record call history
#[async_trait]
pub trait SupportsHistory: Send + Sync {
    /// Appends `value` to the list under `key`, returning the new length
    async fn rpush(&self, key: &str, value: &[u8]) -> Result<usize>;

    /// Reads the whole list under `key`, empty when absent
    async fn lrange_all(&self, key: &str) -> Result<Vec<Vec<u8>>>;
}
