use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that sends an API key in an HTTP header.
///
/// The current MTA endpoints read the key from `x-api-key`. The header name and
/// value are validated once, when the wrapper is built.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid API key header name {header_name:?}"))?;
        let mut key = HeaderValue::from_str(key).context("API key is not a valid header value")?;
        key.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            key,
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    #[test]
    fn test_rejects_invalid_header_name() {
        assert!(ApiKey::new(BasicClient::new(), "bad header", "secret").is_err());
    }

    #[test]
    fn test_rejects_invalid_key() {
        assert!(ApiKey::new(BasicClient::new(), "x-api-key", "line\nbreak").is_err());
    }

    #[test]
    fn test_accepts_valid_key() {
        assert!(ApiKey::new(BasicClient::new(), "x-api-key", "abc123").is_ok());
    }
}
