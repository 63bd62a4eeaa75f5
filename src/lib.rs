//! redis-basic library
//!
//! A call-counting cache facade over Redis and a time-boxed page cache.
//! The modules are exposed for the demo binary and the integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod store;
pub mod web;

pub use cache::{replay, Cache, Operation};
pub use config::StoreConfig;
pub use error::{CacheError, Result};
pub use store::{MemoryStore, RedisStore, Store, SupportsHistory, Value};
pub use web::PageCache;
