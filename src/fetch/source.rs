use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use super::client::HttpClient;
use super::{feed_url, fetch_bytes};

/// Fetch capability for feed partitions: one raw payload per call.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, feed_id: &str) -> Result<Bytes>;
}

/// [`FeedSource`] that GETs each partition from a URL template.
pub struct HttpFeedSource {
    client: Arc<dyn HttpClient>,
    url_template: String,
}

impl HttpFeedSource {
    pub fn new(client: Arc<dyn HttpClient>, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, feed_id: &str) -> Result<Bytes> {
        let url = feed_url(&self.url_template, feed_id);
        fetch_bytes(self.client.as_ref(), &url).await
    }
}
