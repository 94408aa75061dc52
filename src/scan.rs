//! Index page scanning.
//!
//! An index page lists an author's works; each work links to a detail page
//! whose path carries the author and title ids. Anything else on the page is
//! ignored.

use scraper::Html;
use tracing::{debug, info};
use url::Url;

use crate::config::SiteLayout;
use crate::entry::ListItem;
use crate::error::CollectorError;
use crate::io::HttpFetcher;

/// Fetch an index page and list the works it links to, in document order.
pub async fn scan_list(
    fetcher: &HttpFetcher,
    layout: &SiteLayout,
    index_url: &Url,
) -> Result<Vec<ListItem>, CollectorError> {
    info!(url = %index_url, "scanning index page");
    let html = fetcher.get_document(index_url).await?;
    let items = parse_list(&html, layout)?;
    info!(url = %index_url, items = items.len(), "index page scanned");
    Ok(items)
}

/// Extract detail-page links from index page markup.
///
/// Duplicate links are kept. Detail URLs are rebuilt on the layout's site
/// root so relative and absolute hrefs come out the same.
pub fn parse_list(html: &str, layout: &SiteLayout) -> Result<Vec<ListItem>, CollectorError> {
    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for anchor in document.select(layout.index_anchors()) {
        let href = anchor.value().attr("href").unwrap_or("");
        let Some(caps) = layout.card_pattern().captures(href) else {
            continue;
        };
        let (Some(author_id), Some(title_id)) = (caps.get(1), caps.get(2)) else {
            continue;
        };

        let author_id = author_id.as_str().to_string();
        let title_id = title_id.as_str().to_string();
        let detail_url = layout.detail_url(&author_id, &title_id)?;
        let title = anchor.text().collect::<String>().trim().to_string();
        debug!(%title, %detail_url, "found work");

        items.push(ListItem {
            title,
            author_id,
            title_id,
            detail_url,
        });
    }

    Ok(items)
}
