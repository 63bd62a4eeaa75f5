//! Redis-backed store over a multiplexed async connection

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;

use super::{Store, SupportsHistory};
use crate::error::Result;

/// Store handle backed by a live Redis server
///
/// Cloning is cheap; clones share the same multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Opens a multiplexed connection to the server at `url`
    ///
    /// # Arguments
    /// * `url` - Connection URL such as `redis://127.0.0.1:6379/0`
    ///
    /// # Returns
    /// * `Ok(RedisStore)` once the server has accepted the connection
    /// * `Err(CacheError::Store)` if the URL is invalid or the server is unreachable
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        let info = client.get_connection_info();
        info!(addr = %info.addr, db = info.redis.db, "Connected to Redis");
        Ok(Self { conn })
    }

    /// Wraps an already established connection
    pub fn with_connection(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, delta).await?;
        Ok(value)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        // PSETEX rejects a zero expiry
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let _: () = conn.pset_ex(key, value, millis).await?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        info!("Flushed Redis database");
        Ok(())
    }
}

#[async_trait]
impl SupportsHistory for RedisStore {
    async fn rpush(&self, key: &str, value: &[u8]) -> Result<usize> {
        let mut conn = self.conn.clone();
        let len: usize = conn.rpush(key, value).await?;
        Ok(len)
    }

    async fn lrange_all(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let items: Vec<Vec<u8>> = conn.lrange(key, 0, -1).await?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    //! These need a running server: `cargo test -- --ignored`. The database
    //! comes from `REDIS_TEST_URL` and is flushed, so point it at a scratch db.

    use super::*;
    use crate::cache::{call_log, Cache, Operation};
    use std::sync::Arc;
    use tokio::sync::{Mutex, MutexGuard};

    const DEFAULT_TEST_URL: &str = "redis://127.0.0.1:6379/15";

    // Tests share one database and some of them flush it
    static SERVER: Mutex<()> = Mutex::const_new(());

    async fn test_store() -> (RedisStore, MutexGuard<'static, ()>) {
        let guard = SERVER.lock().await;
        let url = std::env::var("REDIS_TEST_URL")
            .unwrap_or_else(|_| DEFAULT_TEST_URL.to_string());
        let store = RedisStore::connect(&url).await.unwrap();
        store.flush().await.unwrap();
        (store, guard)
    }

    #[tokio::test]
    #[ignore = "needs a Redis server"]
    async fn test_set_get_binary_value() {
        let (store, _guard) = test_store().await;
        let bytes = vec![0u8, 0xff, b'\n', 0x80];

        store.set("bin", &bytes).await.unwrap();
        assert_eq!(store.get("bin").await.unwrap(), Some(bytes));
        assert_eq!(store.get("missing").await.unwrap(), None);
        assert!(store.exists("bin").await.unwrap());
        assert!(!store.exists("missing").await.unwrap());
    }

    #[tokio::test]
    #[ignore = "needs a Redis server"]
    async fn test_incr_starts_from_absent_key() {
        let (store, _guard) = test_store().await;

        assert_eq!(store.incr("counter", 1).await.unwrap(), 1);
        assert_eq!(store.incr("counter", 5).await.unwrap(), 6);
        assert_eq!(store.get("counter").await.unwrap(), Some(b"6".to_vec()));
    }

    #[tokio::test]
    #[ignore = "needs a Redis server"]
    async fn test_incr_on_text_fails() {
        let (store, _guard) = test_store().await;
        store.set("text", b"abc").await.unwrap();
        assert!(store.incr("text", 1).await.is_err());
    }

    #[tokio::test]
    #[ignore = "needs a Redis server"]
    async fn test_rpush_keeps_insertion_order() {
        let (store, _guard) = test_store().await;

        assert_eq!(store.rpush("list", b"a").await.unwrap(), 1);
        assert_eq!(store.rpush("list", b"b").await.unwrap(), 2);
        assert_eq!(store.rpush("list", b"c").await.unwrap(), 3);
        assert_eq!(
            store.lrange_all("list").await.unwrap(),
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
        );
        assert!(store.lrange_all("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "needs a Redis server"]
    async fn test_set_ex_expires() {
        let (store, _guard) = test_store().await;

        store
            .set_ex("short", b"page", Duration::from_millis(50))
            .await
            .unwrap();
        store
            .set_ex("long", b"page", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(store.get("short").await.unwrap(), Some(b"page".to_vec()));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.get("short").await.unwrap(), None);
        assert!(store.exists("long").await.unwrap());
    }

    #[tokio::test]
    #[ignore = "needs a Redis server"]
    async fn test_flush_removes_values_and_lists() {
        let (store, _guard) = test_store().await;
        store.set("k", b"v").await.unwrap();
        store.rpush("l", b"x").await.unwrap();

        store.flush().await.unwrap();

        assert!(!store.exists("k").await.unwrap());
        assert!(store.lrange_all("l").await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "needs a Redis server"]
    async fn test_cache_over_redis_replays_calls() {
        let (store, _guard) = test_store().await;
        let cache = Cache::new(Arc::new(store));

        let first = cache.store("foo").await.unwrap();
        let second = cache.store(42).await.unwrap();
        assert_eq!(cache.get_str(&first).await.unwrap().as_deref(), Some("foo"));
        assert_eq!(cache.get_int(&second).await.unwrap(), Some(42));

        let log = call_log(&cache.bind(Operation::Store))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(log.count, 2);
        assert_eq!(log.calls[0].input, "('foo',)");
        assert_eq!(log.calls[0].output, first);
        assert_eq!(log.calls[1].input, "(42,)");
        assert_eq!(log.calls[1].output, second);
    }
}
