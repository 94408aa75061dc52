//! Detail page resolution: the author's name and the work's archive link.

use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use crate::config::SiteLayout;
use crate::entry::DetailPage;
use crate::error::CollectorError;
use crate::io::HttpFetcher;

/// Fetch a detail page and read the author and archive link from it.
///
/// Only fetching or decoding the page can fail. A page whose layout lacks
/// the author cell or an archive link resolves to empty fields instead.
pub async fn resolve_detail(
    fetcher: &HttpFetcher,
    layout: &SiteLayout,
    detail_url: &Url,
) -> Result<DetailPage, CollectorError> {
    debug!(url = %detail_url, "query");
    let html = fetcher.get_document(detail_url).await?;
    Ok(parse_detail(&html, layout, detail_url))
}

/// Read the author and archive link from detail page markup.
///
/// When the download section lists several archives the last one wins.
pub fn parse_detail(html: &str, layout: &SiteLayout, detail_url: &Url) -> DetailPage {
    let document = Html::parse_document(html);

    let author = document
        .select(layout.author_cell())
        .next()
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let archive_href = document
        .select(layout.download_anchors())
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| href.ends_with(layout.archive_suffix()))
        .last();

    let archive_url = archive_href.and_then(|href| match resolve_archive_href(detail_url, href) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(url = %detail_url, error = %e, "ignoring unusable archive link");
            None
        }
    });

    DetailPage {
        author,
        archive_url,
    }
}

/// Turn an archive href from a detail page into an absolute URL.
///
/// Absolute http(s) links are used as they are. Anything else is taken to
/// be relative to the directory holding the detail page, with `.` and `..`
/// segments folded away.
pub fn resolve_archive_href(detail_url: &Url, href: &str) -> Result<Url, CollectorError> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Url::parse(href).map_err(|e| CollectorError::invalid_url(href, e));
    }

    let page_path = detail_url.path();
    let dir = match page_path.rfind('/') {
        Some(i) => &page_path[..=i],
        None => "/",
    };

    let mut url = detail_url.clone();
    url.set_path(&clean_path(&format!("{dir}{href}")));
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Lexically normalise an absolute path: drop empty and `.` segments and
/// let `..` remove its parent, never climbing above the root.
fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    fn layout() -> SiteLayout {
        SiteLayout::new(SiteConfig::default()).unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn page(downloads: &str) -> String {
        format!(
            r#"<html><body>
            <table summary="作家データ">
              <tr><td class="header">作家名：</td><td><font size="+2"><a href="../../index_pages/person148.html">夏目 漱石</a></font></td></tr>
              <tr><td class="header">作家名読み：</td><td>なつめ そうせき</td></tr>
            </table>
            <table class="download" summary="ダウンロードデータ">
              <tr><th>ファイル種別</th><th>ファイル名</th></tr>
              {downloads}
            </table>
            </body></html>"#
        )
    }

    #[test]
    fn relative_href_resolves_next_to_detail_page() {
        let detail = url("https://site.example/cards/1/card2.html");
        assert_eq!(
            resolve_archive_href(&detail, "card2.zip").unwrap().as_str(),
            "https://site.example/cards/1/card2.zip"
        );
        assert_eq!(
            resolve_archive_href(&detail, "./files/2_ruby.zip").unwrap().as_str(),
            "https://site.example/cards/1/files/2_ruby.zip"
        );
        assert_eq!(
            resolve_archive_href(&detail, "../shared/2.zip").unwrap().as_str(),
            "https://site.example/cards/shared/2.zip"
        );
    }

    #[test]
    fn absolute_href_is_used_verbatim() {
        let detail = url("https://site.example/cards/1/card2.html");
        let href = "https://mirror.example/files/card2.zip";
        assert_eq!(resolve_archive_href(&detail, href).unwrap().as_str(), href);
    }

    #[test]
    fn dot_segments_cannot_escape_root() {
        let detail = url("https://site.example/card2.html?from=index#top");
        assert_eq!(
            resolve_archive_href(&detail, "../../x.zip").unwrap().as_str(),
            "https://site.example/x.zip"
        );
    }

    #[test]
    fn author_and_archive_are_read() {
        let detail = url("https://www.aozora.gr.jp/cards/000148/card773.html");
        let html = page(
            r#"<tr bgcolor="white"><td><a href="./files/773_ruby_5968.zip">773_ruby_5968.zip</a></td></tr>"#,
        );
        let parsed = parse_detail(&html, &layout(), &detail);
        assert_eq!(parsed.author, "夏目 漱石");
        assert_eq!(
            parsed.archive_url.unwrap().as_str(),
            "https://www.aozora.gr.jp/cards/000148/files/773_ruby_5968.zip"
        );
    }

    #[test]
    fn last_archive_link_wins() {
        let detail = url("https://site.example/cards/1/card2.html");
        let html = page(
            r#"<tr><td><a href="a.zip">a</a></td></tr>
               <tr><td><a href="b.html">html</a></td></tr>
               <tr><td><a href="b.zip">b</a></td></tr>
               <tr><td><a href="c.txt">c</a></td></tr>"#,
        );
        let parsed = parse_detail(&html, &layout(), &detail);
        assert_eq!(
            parsed.archive_url.unwrap().as_str(),
            "https://site.example/cards/1/b.zip"
        );
    }

    #[test]
    fn page_without_archive_has_no_url() {
        let detail = url("https://site.example/cards/1/card2.html");
        let html = page(r#"<tr><td><a href="2.html">XHTML</a></td></tr>"#);
        let parsed = parse_detail(&html, &layout(), &detail);
        assert_eq!(parsed.author, "夏目 漱石");
        assert_eq!(parsed.archive_url, None);
    }

    #[test]
    fn zip_links_outside_download_table_are_ignored() {
        let detail = url("https://site.example/cards/1/card2.html");
        let html = r#"<p><a href="elsewhere.zip">zip</a></p>"#;
        assert_eq!(parse_detail(html, &layout(), &detail), DetailPage::default());
    }
}
