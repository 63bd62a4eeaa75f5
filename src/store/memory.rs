//! In-process store used by tests and offline runs
//!
//! Mirrors the Redis semantics the caches depend on: missing counters start
//! at zero, `incr` keeps an existing expiry, and list and string keys cannot
//! be mixed. Expiry is measured on the tokio clock so tests can pause and
//! advance time.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use redis::{ErrorKind, RedisError};
use tokio::time::Instant;

use super::{Store, SupportsHistory};
use crate::error::Result;

/// A string value and its optional deadline
#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

#[derive(Debug, Default)]
struct State {
    values: HashMap<String, Entry>,
    lists: HashMap<String, Vec<Vec<u8>>>,
}

impl State {
    /// Drops `key` if its deadline has passed and returns the live entry
    fn live_entry(&mut self, key: &str) -> Option<&mut Entry> {
        let now = Instant::now();
        if self.values.get(key).is_some_and(|entry| !entry.is_live(now)) {
            self.values.remove(key);
        }
        self.values.get_mut(key)
    }
}

/// Thread-safe in-memory implementation of [`Store`] and [`SupportsHistory`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of live string keys plus list keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let state = self.lock();
        state.values.values().filter(|e| e.is_live(now)).count() + state.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn wrong_type() -> RedisError {
    RedisError::from((
        ErrorKind::TypeError,
        "WRONGTYPE Operation against a key holding the wrong kind of value",
    ))
}

fn not_an_integer() -> RedisError {
    RedisError::from((ErrorKind::TypeError, "value is not an integer or out of range"))
}

#[async_trait]
impl Store for MemoryStore {
    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut state = self.lock();
        state.lists.remove(key);
        state.values.insert(
            key.to_string(),
            Entry {
                bytes: value.to_vec(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut state = self.lock();
        if state.lists.contains_key(key) {
            return Err(wrong_type().into());
        }
        Ok(state.live_entry(key).map(|entry| entry.bytes.clone()))
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<i64> {
        let mut state = self.lock();
        if state.lists.contains_key(key) {
            return Err(wrong_type().into());
        }

        let current = match state.live_entry(key) {
            Some(entry) => std::str::from_utf8(&entry.bytes)
                .ok()
                .and_then(|text| text.parse::<i64>().ok())
                .ok_or_else(not_an_integer)?,
            None => 0,
        };
        let next = current.checked_add(delta).ok_or_else(not_an_integer)?;

        let expires_at = state.live_entry(key).and_then(|entry| entry.expires_at);
        state.values.insert(
            key.to_string(),
            Entry {
                bytes: next.to_string().into_bytes(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut state = self.lock();
        Ok(state.lists.contains_key(key) || state.live_entry(key).is_some())
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut state = self.lock();
        state.lists.remove(key);
        state.values.insert(
            key.to_string(),
            Entry {
                bytes: value.to_vec(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let mut state = self.lock();
        state.values.clear();
        state.lists.clear();
        Ok(())
    }
}

#[async_trait]
impl SupportsHistory for MemoryStore {
    async fn rpush(&self, key: &str, value: &[u8]) -> Result<usize> {
        let mut state = self.lock();
        if state.live_entry(key).is_some() {
            return Err(wrong_type().into());
        }
        let list = state.lists.entry(key.to_string()).or_default();
        list.push(value.to_vec());
        Ok(list.len())
    }

    async fn lrange_all(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        let mut state = self.lock();
        if state.live_entry(key).is_some() {
            return Err(wrong_type().into());
        }
        Ok(state.lists.get(key).cloned().unwrap_or_default())
    }
}
