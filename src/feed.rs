//! Upstream registration feed retrieval

use crate::error::{Result, WatchError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Source of raw feed payloads
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current payload. Non-success responses are errors.
    async fn fetch(&self) -> Result<String>;
}

/// Fetches the feed over HTTP
#[derive(Debug, Clone)]
pub struct HttpFeed {
    url: String,
    client: Client,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<String> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(WatchError::FeedStatus {
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        log::debug!("Fetched {} bytes from {}", body.len(), self.url);
        Ok(body)
    }
}
