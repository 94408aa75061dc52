//! The crawl pipeline: index page, then each detail page, then each archive.
//!
//! Items are processed strictly one after another in index order. Only the
//! index page is essential; anything that goes wrong with a single item is
//! logged and that item is dropped.

use std::io::Write;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SiteLayout;
use crate::detail::resolve_detail;
use crate::entry::{CatalogEntry, ListItem};
use crate::error::CollectorError;
use crate::extract::fetch_and_extract;
use crate::io::HttpFetcher;
use crate::scan::scan_list;

/// Outcome counters for one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Detail-page links found on the index page
    pub discovered: usize,
    /// Texts written to the output
    pub emitted: usize,
    /// Detail pages without an archive link
    pub no_archive: usize,
    /// Items dropped because a fetch, parse, extraction or decode failed
    pub failed: usize,
    /// Body bytes received over the network
    pub bytes_downloaded: u64,
}

/// Crawls one catalog site.
pub struct Collector {
    fetcher: HttpFetcher,
    layout: SiteLayout,
}

impl Collector {
    pub fn new(fetcher: HttpFetcher, layout: SiteLayout) -> Self {
        Self { fetcher, layout }
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    /// Scan the index page and resolve every detail page.
    ///
    /// Works without an archive link are left out. Fails only if the index
    /// page itself cannot be fetched or parsed.
    pub async fn entries(&self, index_url: &Url) -> Result<Vec<CatalogEntry>, CollectorError> {
        let items = scan_list(&self.fetcher, &self.layout, index_url).await?;
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            if let Some(entry) = self.resolve(index_url, item).await {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Run the full pipeline, writing each extracted text to `out` followed
    /// by a newline.
    ///
    /// Each item is resolved, downloaded, decoded and written before the next
    /// one starts. A failure to write to `out` stops the crawl.
    pub async fn run<W: Write>(
        &self,
        index_url: &Url,
        out: &mut W,
    ) -> Result<CrawlStats, CollectorError> {
        let items = scan_list(&self.fetcher, &self.layout, index_url).await?;
        let mut stats = CrawlStats {
            discovered: items.len(),
            ..CrawlStats::default()
        };

        for item in items {
            let title = item.title.clone();
            let entry = match self.resolve_detail_for(index_url, item).await {
                Ok(Some(entry)) => entry,
                Ok(None) => {
                    stats.no_archive += 1;
                    continue;
                }
                Err(e) => {
                    warn!(%title, error = %e, "skipping item: detail page unavailable");
                    stats.failed += 1;
                    continue;
                }
            };

            match fetch_and_extract(&self.fetcher, &self.layout, &entry.archive_url).await {
                Ok(extracted) => {
                    writeln!(out, "{}", extracted.text).map_err(|source| CollectorError::Io {
                        path: "<output>".into(),
                        source,
                    })?;
                    stats.emitted += 1;
                }
                Err(e) => {
                    warn!(title = %entry.title, archive = %entry.archive_url, error = %e, "skipping item");
                    stats.failed += 1;
                }
            }
        }

        stats.bytes_downloaded = self.fetcher.transferred_bytes();
        info!(
            discovered = stats.discovered,
            emitted = stats.emitted,
            no_archive = stats.no_archive,
            failed = stats.failed,
            "crawl finished"
        );
        Ok(stats)
    }

    /// Best-effort resolution used when only the entry list is wanted
    async fn resolve(&self, index_url: &Url, item: ListItem) -> Option<CatalogEntry> {
        let title = item.title.clone();
        match self.resolve_detail_for(index_url, item).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%title, error = %e, "skipping item: detail page unavailable");
                None
            }
        }
    }

    async fn resolve_detail_for(
        &self,
        index_url: &Url,
        item: ListItem,
    ) -> Result<Option<CatalogEntry>, CollectorError> {
        let detail = resolve_detail(&self.fetcher, &self.layout, &item.detail_url).await?;
        if detail.archive_url.is_none() {
            debug!(title = %item.title, url = %item.detail_url, "no archive link, dropping");
        }
        Ok(CatalogEntry::from_parts(index_url, item, detail))
    }
}
