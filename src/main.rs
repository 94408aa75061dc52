//! Main entry point for the aozora-collector CLI application.
//!
//! Extracted text goes to stdout; logs go to stderr.

use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;

use aozora_collector::cli::{Command, CrawlArgs, ExtractArgs};
use aozora_collector::entry::write_entries;
use aozora_collector::extract::extract_text;
use aozora_collector::zip::write_member_table;
use aozora_collector::{
    Cli, Collector, HttpFetcher, MemoryReader, ReadAt, SiteConfig, SiteLayout, ZipExtractor,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    debug!(?cli, "arguments parsed");

    let fetcher = HttpFetcher::new(Duration::from_secs(cli.timeout), cli.max_body_size)?;

    match &cli.command {
        Command::Crawl(args) => crawl(fetcher, args).await,
        Command::List(args) => list(fetcher, args).await,
        Command::Extract(args) => extract(fetcher, args).await,
    }
}

/// Run the full pipeline and stream every text to stdout.
///
/// An unreadable index page ends the process with an error; failures on
/// individual works are logged and skipped inside the collector.
async fn crawl(fetcher: HttpFetcher, args: &CrawlArgs) -> Result<()> {
    let collector = Collector::new(fetcher, layout_for(args)?);

    let mut stdout = io::stdout().lock();
    let stats = collector.run(&args.index_url, &mut stdout).await?;
    stdout.flush()?;

    info!(
        emitted = stats.emitted,
        of = stats.discovered,
        downloaded = %format_size(stats.bytes_downloaded),
        "done"
    );
    Ok(())
}

/// Print one tab-separated line per work that has an archive
async fn list(fetcher: HttpFetcher, args: &CrawlArgs) -> Result<()> {
    let collector = Collector::new(fetcher, layout_for(args)?);
    let entries = collector.entries(&args.index_url).await?;

    write_entries(&entries, &mut io::stdout().lock())?;
    Ok(())
}

/// Print the text of one archive, or list its members with `-l`
async fn extract(fetcher: HttpFetcher, args: &ExtractArgs) -> Result<()> {
    let reader = if args.is_http_url() {
        let url = Url::parse(&args.archive)?;
        MemoryReader::new(fetcher.get_bytes(&url).await?)
    } else {
        MemoryReader::from_path(Path::new(&args.archive)).await?
    };
    let reader = Arc::new(reader);

    if args.list {
        return list_members(reader).await;
    }

    let layout = SiteLayout::new(SiteConfig::default())?;
    let extracted = extract_text(reader, &layout, &args.archive).await?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", extracted.text)?;
    stdout.flush()?;
    Ok(())
}

/// List archive members with sizes and modification times.
async fn list_members<R: ReadAt + 'static>(reader: Arc<R>) -> Result<()> {
    let entries = ZipExtractor::new(reader).list_files().await?;
    write_member_table(&entries, &mut io::stdout().lock())?;
    Ok(())
}

fn layout_for(args: &CrawlArgs) -> Result<SiteLayout> {
    let config = SiteConfig::default().with_site_root(args.site_root.clone());
    Ok(SiteLayout::new(config)?)
}

/// Format a byte count with the largest fitting binary unit.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
