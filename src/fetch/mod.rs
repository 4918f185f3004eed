//! Fetching raw feed payloads over HTTP.
//!
//! [`FeedSource`] is the seam the poller talks to. [`HttpFeedSource`] backs it
//! with an [`HttpClient`]: [`BasicClient`] performs plain requests and the
//! [`auth`] wrappers attach the agency credential.

pub mod auth;
mod basic;
mod client;
mod source;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use source::{FeedSource, HttpFeedSource};

use anyhow::Result;
use bytes::Bytes;

/// GETs `url` through `client` and returns the body.
///
/// # Errors
///
/// Fails on an unparsable URL, a transport error, or a non-2xx status.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Bytes> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?)
}

/// Expands a feed URL template, replacing `{feed}` with the partition id.
pub fn feed_url(template: &str, feed_id: &str) -> String {
    template.replace("{feed}", feed_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url_substitutes_partition() {
        assert_eq!(
            feed_url("http://datamine.mta.info/mta_esi.php?feed_id={feed}", "26"),
            "http://datamine.mta.info/mta_esi.php?feed_id=26"
        );
        assert_eq!(
            feed_url("https://example.test/nyct%2Fgtfs-{feed}", "ace"),
            "https://example.test/nyct%2Fgtfs-ace"
        );
    }
}
