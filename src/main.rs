//! Binary entry point: flag parsing, logging setup, shutdown wiring

use clap::Parser;
use gallery_watch::{Config, Crawler, HttpGallerySource, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Watch a gallery's article list and archive its images, deduplicated by
/// content digest
#[derive(Debug, Parser)]
#[command(name = "gallery-watch", version, about)]
struct Cli {
    /// Gallery identifier (e.g., "programming")
    #[arg(long, conflicts_with = "list_url")]
    gallery: Option<String>,

    /// Full list URL (e.g., "https://m.dcinside.com/list.php?id=programming")
    #[arg(long)]
    list_url: Option<String>,

    /// Base directory for stored images
    #[arg(long, default_value = "./image")]
    image_dir: PathBuf,

    /// Seconds between list polls
    #[arg(long, default_value_t = 3)]
    interval_secs: u64,

    /// Per-request HTTP timeout in seconds (no timeout if omitted)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            gallery: cli.gallery,
            list_url: cli.list_url,
            image_dir: cli.image_dir,
            poll_interval: Duration::from_secs(cli.interval_secs),
            request_timeout: cli.timeout_secs.map(Duration::from_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config: Config = Cli::parse().into();
    let target = config.resolved_list_url()?;
    info!(%target, "crawl starting");

    let source = Arc::new(HttpGallerySource::from_config(&config)?);
    let crawler = Crawler::new(config, source).await?;

    let shutdown = crawler.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("ctrl-c received");
                shutdown.cancel();
            }
            Err(e) => error!(error = %e, "cannot listen for ctrl-c"),
        }
    });

    crawler.run().await;
    Ok(())
}
