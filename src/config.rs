//! Site layout: every selector, pattern and suffix the collector relies on.
//!
//! A change in the catalog's markup should only ever touch [`SiteConfig`].

use regex::Regex;
use scraper::Selector;
use url::Url;

use crate::error::CollectorError;

/// Root of the Aozora Bunko site
pub const DEFAULT_SITE_ROOT: &str = "https://www.aozora.gr.jp/";

/// Author index page crawled when no URL is given
pub const DEFAULT_INDEX_URL: &str = "https://www.aozora.gr.jp/index_pages/person1346.html";

/// Raw layout settings for one catalog site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Base that canonical detail-page URLs are built on
    pub site_root: Url,
    /// Matches detail-page hrefs; capture 1 is the author id, capture 2 the title id
    pub card_pattern: String,
    /// Anchors on an index page that may link to detail pages
    pub index_anchor_selector: String,
    /// Cell holding the author's name on a detail page
    pub author_cell_selector: String,
    /// Anchors inside a detail page's download section
    pub download_anchor_selector: String,
    /// Suffix identifying archive links
    pub archive_suffix: String,
    /// Suffix identifying the text member inside an archive
    pub text_extension: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_root: Url::parse(DEFAULT_SITE_ROOT).expect("default site root is a valid URL"),
            card_pattern: r"/cards/([0-9]+)/card([0-9]+)\.html$".to_string(),
            index_anchor_selector: "ol li a".to_string(),
            author_cell_selector: r#"table[summary="作家データ"] tr:nth-child(1) td:nth-child(2)"#
                .to_string(),
            download_anchor_selector: "table.download a".to_string(),
            archive_suffix: ".zip".to_string(),
            text_extension: ".txt".to_string(),
        }
    }
}

impl SiteConfig {
    /// Use a different site root, keeping every other setting
    pub fn with_site_root(mut self, site_root: Url) -> Self {
        self.site_root = site_root;
        self
    }
}

/// A [`SiteConfig`] with its selectors and pattern compiled.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    config: SiteConfig,
    card_pattern: Regex,
    index_anchors: Selector,
    author_cell: Selector,
    download_anchors: Selector,
}

impl SiteLayout {
    pub fn new(mut config: SiteConfig) -> Result<Self, CollectorError> {
        // `Url::join` replaces the last segment of a root without a trailing slash
        if !config.site_root.path().ends_with('/') {
            let path = format!("{}/", config.site_root.path());
            config.site_root.set_path(&path);
        }

        let card_pattern = Regex::new(&config.card_pattern).map_err(|e| CollectorError::Layout {
            what: "card_pattern",
            reason: e.to_string(),
        })?;
        if card_pattern.captures_len() < 3 {
            return Err(CollectorError::Layout {
                what: "card_pattern",
                reason: "needs an author id group and a title id group".to_string(),
            });
        }

        Ok(Self {
            index_anchors: compile_selector("index_anchor_selector", &config.index_anchor_selector)?,
            author_cell: compile_selector("author_cell_selector", &config.author_cell_selector)?,
            download_anchors: compile_selector(
                "download_anchor_selector",
                &config.download_anchor_selector,
            )?,
            card_pattern,
            config,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn card_pattern(&self) -> &Regex {
        &self.card_pattern
    }

    pub fn index_anchors(&self) -> &Selector {
        &self.index_anchors
    }

    pub fn author_cell(&self) -> &Selector {
        &self.author_cell
    }

    pub fn download_anchors(&self) -> &Selector {
        &self.download_anchors
    }

    pub fn archive_suffix(&self) -> &str {
        &self.config.archive_suffix
    }

    pub fn text_extension(&self) -> &str {
        &self.config.text_extension
    }

    /// Canonical detail-page URL for an author/title id pair
    pub fn detail_url(&self, author_id: &str, title_id: &str) -> Result<Url, CollectorError> {
        let path = format!("cards/{author_id}/card{title_id}.html");
        self.config
            .site_root
            .join(&path)
            .map_err(|e| CollectorError::invalid_url(path, e))
    }
}

fn compile_selector(what: &'static str, selector: &str) -> Result<Selector, CollectorError> {
    Selector::parse(selector).map_err(|e| CollectorError::Layout {
        what,
        reason: e.to_string(),
    })
}
