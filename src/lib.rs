//! # aozora-collector
//!
//! Collects the works of one author from the Aozora Bunko catalog and turns
//! them into UTF-8 text.
//!
//! A crawl is a straight pipeline:
//!
//! 1. [`scan`]: the author's index page is scanned for links to detail pages
//! 2. [`detail`]: each detail page yields the author's name and an archive link
//! 3. [`extract`]: each archive is downloaded, its `.txt` member located and
//!    decoded from Shift_JIS
//!
//! [`Collector`] drives the three stages one item at a time. Every selector,
//! pattern and suffix the stages rely on lives in [`SiteConfig`].
//!
//! ## Example
//!
//! ```no_run
//! use aozora_collector::{Collector, HttpFetcher, SiteConfig, SiteLayout};
//! use aozora_collector::io::{DEFAULT_MAX_BODY_BYTES, DEFAULT_TIMEOUT};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = HttpFetcher::new(DEFAULT_TIMEOUT, DEFAULT_MAX_BODY_BYTES)?;
//!     let layout = SiteLayout::new(SiteConfig::default())?;
//!     let collector = Collector::new(fetcher, layout);
//!
//!     let index = Url::parse("https://www.aozora.gr.jp/index_pages/person148.html")?;
//!     for entry in collector.entries(&index).await? {
//!         println!("{} {}", entry.title, entry.archive_url);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod collector;
pub mod config;
pub mod detail;
pub mod entry;
pub mod error;
pub mod extract;
pub mod io;
pub mod scan;
pub mod text;
pub mod zip;

pub use cli::Cli;
pub use collector::{Collector, CrawlStats};
pub use config::{SiteConfig, SiteLayout};
pub use entry::{CatalogEntry, DetailPage, ListItem};
pub use error::CollectorError;
pub use extract::ExtractedText;
pub use io::{HttpFetcher, MemoryReader, ReadAt};
pub use zip::{ArchiveError, ZipExtractor, ZipFileEntry};
