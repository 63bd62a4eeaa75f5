//! Error types for the cache facade and the page cache
//!
//! Failures from the key-value store, the HTTP client, and value decoding are
//! wrapped as-is so callers can still reach the original error.

use std::num::ParseIntError;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Errors that can occur while talking to the store or fetching pages
#[derive(Debug, Error)]
pub enum CacheError {
    /// The key-value store rejected a command or the connection failed
    #[error("Store request failed: {0}")]
    Store(#[from] redis::RedisError),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Stored bytes are not valid UTF-8
    #[error("Stored value is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// Stored text is not an integer
    #[error("Stored value is not an integer: {0}")]
    ParseInt(#[from] ParseIntError),

    /// Writing replay output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;
