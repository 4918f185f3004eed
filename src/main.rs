//! CLI entry point for the subway frequency estimator.
//!
//! Provides subcommands for polling the feed partitions continuously,
//! estimating a single feed snapshot, and listing the service tiers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use subway_frequency::{
    config::{FeedConfig, PollConfig},
    fetch::{HttpFeedSource, fetch_bytes},
    headway::{ServiceTier, aggregate_snapshot},
    output::{log_view_json, render_tiers, render_view},
    parser::{FeedDecoder, NyctDecoder, decode_trips},
    poller::{Poller, PollerSettings, supervise},
    state::SharedState,
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "subway_frequency")]
#[command(about = "Estimates subway service frequency from GTFS-RT feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every feed partition on a fixed interval
    Poll {
        #[command(flatten)]
        config: PollConfig,
    },
    /// Estimate a single feed snapshot from a file or URL
    Estimate {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[command(flatten)]
        feed: FeedConfig,
    },
    /// List the service tiers and their descriptions
    Tiers,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/subway_frequency.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("subway_frequency.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Poll { config } => poll(config).await?,
        Commands::Estimate { source, feed } => {
            let bytes = fetcher(&source, &feed).await?;
            let decoder = NyctDecoder::load();
            let trips = decode_trips(&decoder, &bytes)?;
            let snapshot = aggregate_snapshot(&trips);

            info!(
                trips = trips.len(),
                lines = snapshot.len(),
                "Snapshot estimated"
            );

            let state = SharedState::new();
            state.merge(snapshot).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&render_view(&state.tiered().await))?
            );
        }
        Commands::Tiers => {
            println!("{}", serde_json::to_string_pretty(&render_tiers())?);
        }
    }

    Ok(())
}

/// Loads feed data from a local file path or fetches it over HTTP.
#[tracing::instrument(skip(feed), fields(source = %url))]
async fn fetcher(url: &str, feed: &FeedConfig) -> Result<Vec<u8>> {
    let bytes = if url.starts_with("http") {
        let client = feed.http_client()?;
        tokio::time::timeout(feed.fetch_timeout(), fetch_bytes(client.as_ref(), url))
            .await
            .context("feed fetch timed out")??
            .to_vec()
    } else {
        std::fs::read(url).with_context(|| format!("failed to read {url}"))?
    };
    Ok(bytes)
}

/// Runs the poller forever, logging the tier view after every interval.
#[tracing::instrument(skip(config), fields(feeds = config.feed_ids.len(), port = config.port))]
async fn poll(config: PollConfig) -> Result<()> {
    let client = config.feed.http_client()?;
    let source = Arc::new(HttpFeedSource::new(
        client,
        config.feed.feed_url_template.clone(),
    ));
    let decoder: Arc<dyn FeedDecoder> = Arc::new(NyctDecoder::load());
    let state = SharedState::new();

    let poller = Arc::new(Poller::new(
        PollerSettings {
            feed_ids: config.feed_ids.clone(),
            interval: config.poll_interval(),
            fetch_timeout: config.feed.fetch_timeout(),
        },
        source,
        decoder,
        state.clone(),
    ));

    // Summarise the shared state on the same cadence the partitions report
    let period = config.poll_interval();
    let reporter = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            let view = state.tiered().await;
            for tier in ServiceTier::ALL {
                let lines: Vec<&str> = view
                    .get(&tier)
                    .map(|lines| lines.keys().map(String::as_str).collect())
                    .unwrap_or_default();
                info!(tier = tier.info().name, lines = ?lines, "Service tier");
            }
            if let Err(e) = log_view_json(&view) {
                warn!(error = %e, "Failed to render tier view");
            }
        }
    });

    let poller_handle = tokio::spawn(poller.run());

    supervise(poller_handle, reporter)
        .await
        .context("poller stopped unexpectedly")?;
    Ok(())
}
