//! Where the raw feed document comes from.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::debug;

use super::FeedError;

/// HTTP request timeout in seconds.
/// The feed is a single small document; 30s tolerates a slow upstream.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Fetches the raw iCalendar text for a URL.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FeedError>;
}

/// `FeedSource` backed by a reqwest client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new() -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("nextlaunch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<String, FeedError> {
        debug!(url, "Fetching calendar feed");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/calendar")
            .send()
            .await?;

        // Only a plain 200 counts; other 2xx codes carry no usable document
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FeedError::from_status(status, url));
        }

        Ok(response.text().await?)
    }
}
