//! Cached page fetching
//!
//! [`PageCache`] counts requests per URL and keeps each fetched page in the
//! store for a short time (10 seconds by default).

mod fetch;
mod page_cache;

pub use fetch::{Fetch, HttpFetcher};
pub use page_cache::{cached_key, count_key, PageCache};
