use std::io::{self, Write};

use url::Url;

/// A work linked from an index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub title: String,
    pub author_id: String,
    pub title_id: String,
    /// Canonical detail-page URL built from the two ids
    pub detail_url: Url,
}

/// What a detail page says about a work.
///
/// Either field may be empty when the page layout deviates; only a failed
/// fetch or undecodable page is an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailPage {
    pub author: String,
    pub archive_url: Option<Url>,
}

/// A discovered work with a downloadable archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub author_id: String,
    pub author: String,
    pub title_id: String,
    pub title: String,
    /// Index page the work was discovered on
    pub info_url: Url,
    pub archive_url: Url,
}

impl CatalogEntry {
    /// Combine an index link with its resolved detail page.
    ///
    /// Returns `None` when the page had no archive link, which is how
    /// archive-less works drop out of the crawl.
    pub fn from_parts(info_url: &Url, item: ListItem, detail: DetailPage) -> Option<Self> {
        let archive_url = detail.archive_url?;
        Some(Self {
            author_id: item.author_id,
            author: detail.author,
            title_id: item.title_id,
            title: item.title,
            info_url: info_url.clone(),
            archive_url,
        })
    }

    /// Tab-separated record: author id, author, title id, title, index URL, archive URL
    pub fn to_tsv(&self) -> String {
        [
            self.author_id.as_str(),
            self.author.as_str(),
            self.title_id.as_str(),
            self.title.as_str(),
            self.info_url.as_str(),
            self.archive_url.as_str(),
        ]
        .iter()
        .map(|field| field.replace(['\t', '\n', '\r'], " "))
        .collect::<Vec<_>>()
        .join("\t")
    }
}

/// Write one [`CatalogEntry::to_tsv`] line per entry
pub fn write_entries<W: Write>(entries: &[CatalogEntry], out: &mut W) -> io::Result<()> {
    for entry in entries {
        writeln!(out, "{}", entry.to_tsv())?;
    }
    out.flush()
}
