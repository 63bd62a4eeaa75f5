//! redis-basic - store values in Redis and replay how they got there
//!
//! A small command-line front end over the library: store and read values,
//! print the `store` call history, and fetch pages through the cache.

use std::io::{self, Write};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use redis_basic::cache::{call_log, replay, Cache, Operation};
use redis_basic::cli::{parse_value, Cli, Command, Decode};
use redis_basic::config::StoreConfig;
use redis_basic::web::PageCache;

/// Sends logs to stderr so command output on stdout stays clean
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.store_config(StoreConfig::from_env());

    // Validate input before touching the network
    let value = match &cli.command {
        Command::Store { value, kind } => Some(parse_value(*kind, value)?),
        _ => None,
    };

    let cache = Cache::connect(&config).await?;
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Command::Store { .. } => {
            if let Some(value) = value {
                let key = cache.store(value).await?;
                writeln!(stdout, "{}", key)?;
            }
        }
        Command::Get { key, decode } => {
            let text = match decode {
                Decode::Raw => cache
                    .get(key)
                    .await?
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
                Decode::Str => cache.get_str(key).await?,
                Decode::Int => cache.get_int(key).await?.map(|n| n.to_string()),
            };
            writeln!(stdout, "{}", text.as_deref().unwrap_or("(nil)"))?;
        }
        Command::Replay => {
            let op = cache.bind(Operation::Store);
            if cli.json {
                if let Some(log) = call_log(&op).await? {
                    writeln!(stdout, "{}", serde_json::to_string_pretty(&log)?)?;
                }
            } else {
                replay(&op, &mut stdout).await?;
            }
        }
        Command::Page { url, .. } => {
            let pages = PageCache::new(cache.store_handle()).with_ttl(config.page_ttl);
            let html = pages.get_page(url).await?;
            let count = pages.request_count(url).await?;
            info!(url = %url, count, "Page requested");
            write!(stdout, "{}", html)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
