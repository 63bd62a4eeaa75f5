//! Page fetching over HTTP

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::Result;

/// Something that can fetch the text content of a URL
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches pages with a plain HTTP GET
///
/// The body text is returned whatever the status code, so error pages are
/// cached like any other response.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a new HttpFetcher with default settings
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a new HttpFetcher with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        debug!(url, status = %response.status(), "Fetched page");
        let text = response.text().await?;
        Ok(text)
    }
}
