//! Command-line interface parsing for the redis-basic demo binary
//!
//! Each subcommand maps onto one library call: `store`, `get`, `replay`,
//! and `page`. Global flags override the environment-derived `StoreConfig`.

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::config::StoreConfig;
use crate::store::Value;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The value cannot be read as the requested kind
    #[error("Invalid {kind} value: '{value}'")]
    InvalidValue { kind: &'static str, value: String },
}

/// Store values in Redis, read them back, replay call history, and fetch cached pages
#[derive(Parser, Debug)]
#[command(name = "redis-basic")]
#[command(about = "Call-counting Redis cache and time-boxed page cache")]
#[command(version)]
pub struct Cli {
    /// Redis connection URL (defaults to $REDIS_URL or redis://127.0.0.1:6379/)
    #[arg(long, global = true, value_name = "URL")]
    pub redis_url: Option<String>,

    /// Clear the database before running the command
    #[arg(long, global = true)]
    pub flush: bool,

    /// Print replay output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Store a value under a new random key and print the key
    Store {
        value: String,
        /// How to interpret VALUE
        #[arg(long, value_enum, default_value_t = ValueKind::Text)]
        kind: ValueKind,
    },
    /// Print the value stored under KEY, or (nil)
    Get {
        key: String,
        /// How to decode the stored bytes
        #[arg(long = "as", value_enum, default_value_t = Decode::Str)]
        decode: Decode,
    },
    /// Print how often `store` was called and every recorded call
    Replay,
    /// Fetch a page through the cache and print its body
    Page {
        url: String,
        /// Seconds to keep the fetched page cached
        #[arg(long, value_name = "SECS")]
        ttl: Option<u64>,
    },
}

/// Kinds of value accepted by `store`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Int,
    Float,
    Bytes,
}

/// Decodings offered by `get`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    Raw,
    Str,
    Int,
}

/// Parses a `store` argument into a [`Value`] of the requested kind.
///
/// # Arguments
/// * `kind` - The kind selected with `--kind`
/// * `raw` - The value text from the command line
///
/// # Returns
/// * `Ok(Value)` if the text is valid for the kind
/// * `Err(CliError::InvalidValue)` if a number cannot be parsed
pub fn parse_value(kind: ValueKind, raw: &str) -> Result<Value, CliError> {
    let invalid = |kind: &'static str| CliError::InvalidValue {
        kind,
        value: raw.to_string(),
    };

    match kind {
        ValueKind::Text => Ok(Value::Text(raw.to_string())),
        ValueKind::Bytes => Ok(Value::Bytes(raw.as_bytes().to_vec())),
        ValueKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid("int")),
        ValueKind::Float => raw
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid("float")),
    }
}

impl Cli {
    /// Applies the global flags and `page --ttl` on top of `base`
    ///
    /// The CLI never flushes unless `--flush` is given.
    pub fn store_config(&self, base: StoreConfig) -> StoreConfig {
        let mut config = base.with_flush_on_start(self.flush);
        if let Some(url) = &self.redis_url {
            config = config.with_redis_url(url.clone());
        }
        if let Command::Page { ttl: Some(secs), .. } = &self.command {
            config = config.with_page_ttl(Duration::from_secs((*secs).max(1)));
        }
        config
    }
}
