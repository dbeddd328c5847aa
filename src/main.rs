mod cli;
mod error;

use crate::cli::{Cli, Command, LogLevel};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::{OptionExt, ResultExt};
use gallery_catalog::{Backoff, Gallery, GalleryOptions, SizeLimits, monitor};
use gallery_config::Config;
use gallery_media::{ExifExtractor, ImageResizer};
use gallery_source::SourceHandle;
use gallery_source::source::LocalSource;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn initialize_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn build_gallery(config: &Config) -> Result<Gallery> {
    let root = config.source.root.as_deref().ok_or_raise(|| ErrorKind::Config)?;
    let source: SourceHandle = Arc::new(LocalSource::new("local", root).or_raise(|| ErrorKind::Source)?);
    let options = GalleryOptions {
        folder: config.source.folder.clone(),
        fetch_timeout: config.cache.fetch_timeout(),
        enrich_concurrency: config.cache.enrich_concurrency,
        sizes: SizeLimits { default_size: config.thumbnail.default_size, max_size: config.thumbnail.max_size },
    };
    Ok(Gallery::new(source, Arc::new(ImageResizer::default()), Arc::new(ExifExtractor), options))
}

async fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data).await.or_raise(|| ErrorKind::Output(path.to_path_buf()))?;
    tracing::info!(path = %path.display(), bytes = data.len(), "Written");
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let gallery = build_gallery(&config)?;
    // Cold start: failing to build the first catalog is fatal.
    gallery.load().await.or_raise(|| ErrorKind::Catalog)?;

    match cli.command {
        Command::List => {
            let listing = serde_json::json!({ "photos": gallery.list_items() });
            let stdout = std::io::stdout();
            serde_json::to_writer_pretty(stdout.lock(), &listing)
                .or_raise(|| ErrorKind::Output("<stdout>".into()))?;
            println!();
        },
        Command::Get { name, output } => {
            let (item, data) = gallery.get_original(&name).await.or_raise(|| ErrorKind::Catalog)?;
            tracing::debug!(%item, "Found photo");
            write_output(&output, &data).await?;
        },
        Command::Thumb { name, width, height, output } => {
            let (item, data) = gallery.get_derived(&name, width, height).await.or_raise(|| ErrorKind::Catalog)?;
            tracing::debug!(%item, "Found photo");
            write_output(&output, &data).await?;
        },
        Command::Watch => {
            let poll = &config.poll;
            let backoff = Backoff::new(poll.interval(), poll.max_interval(), poll.jitter);
            let gallery = Arc::new(gallery);
            tracing::info!(
                photos = gallery.catalog().len(),
                interval = ?poll.interval(),
                "Watching for changes, press Ctrl-C to stop"
            );
            let handle = monitor(Arc::clone(&gallery), backoff);
            tokio::signal::ctrl_c().await.or_raise(|| ErrorKind::Catalog)?;
            handle.abort();
            tracing::info!(
                photos = gallery.catalog().len(),
                resident_bytes = gallery.resident_bytes(),
                "Stopped"
            );
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_tracing(cli.log_level);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}
