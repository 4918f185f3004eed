//! Startup configuration, read from CLI flags with environment fallbacks.
//!
//! A `.env` file is loaded before parsing, so every setting can live there.

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::fetch::auth::{ApiKey, UrlParam};
use crate::fetch::{BasicClient, HttpClient};

/// Feed partitions polled when none are configured.
pub const DEFAULT_FEED_IDS: &str = "1,26,16,21,2,11,31,36,51";

/// Legacy datamine endpoint; `{feed}` is replaced with the partition id.
pub const DEFAULT_FEED_URL_TEMPLATE: &str = "http://datamine.mta.info/mta_esi.php?feed_id={feed}";

/// How the API key is attached to feed requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyStyle {
    /// Query parameter, `?key=<API_KEY>` by default.
    Query,
    /// HTTP header, `x-api-key: <API_KEY>` by default.
    Header,
}

impl KeyStyle {
    fn default_name(&self) -> &'static str {
        match self {
            KeyStyle::Query => "key",
            KeyStyle::Header => "x-api-key",
        }
    }
}

/// Where and how to fetch feed partitions.
#[derive(Debug, Clone, Args)]
pub struct FeedConfig {
    /// Agency API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// How the API key is sent
    #[arg(long, env = "API_KEY_STYLE", value_enum, default_value_t = KeyStyle::Query)]
    pub key_style: KeyStyle,

    /// Overrides the query parameter or header name used for the API key
    #[arg(long, env = "API_KEY_NAME")]
    pub key_name: Option<String>,

    /// Feed URL template, `{feed}` is replaced with each partition id
    #[arg(long, env = "FEED_URL_TEMPLATE", default_value = DEFAULT_FEED_URL_TEMPLATE)]
    pub feed_url_template: String,

    /// Per-fetch timeout in seconds
    #[arg(
        long,
        env = "FETCH_TIMEOUT_SECS",
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout_secs: u64,
}

/// Settings for the long-running poller.
#[derive(Debug, Clone, Args)]
pub struct PollConfig {
    #[command(flatten)]
    pub feed: FeedConfig,

    /// Comma separated feed partition ids
    #[arg(long, env = "FEED_IDS", value_delimiter = ',', default_value = DEFAULT_FEED_IDS)]
    pub feed_ids: Vec<String>,

    /// Seconds between polling ticks
    #[arg(
        long,
        env = "POLL_INTERVAL_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_secs: u64,

    /// Port of the page that renders the shared state
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
}

impl FeedConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Builds the HTTP client, wrapped to attach the API key if one is set.
    pub fn http_client(&self) -> Result<Arc<dyn HttpClient>> {
        let basic = BasicClient::with_connect_timeout(self.fetch_timeout())?;

        let Some(key) = self.api_key.as_deref() else {
            warn!("API_KEY is not set, fetching feeds without credentials");
            return Ok(Arc::new(basic));
        };

        let name = self
            .key_name
            .as_deref()
            .unwrap_or_else(|| self.key_style.default_name());

        let client: Arc<dyn HttpClient> = match self.key_style {
            KeyStyle::Query => Arc::new(UrlParam::new(basic, name, key)),
            KeyStyle::Header => Arc::new(ApiKey::new(basic, name, key)?),
        };
        Ok(client)
    }
}

impl PollConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
