//! Error types shared by every stage of the collector.
//!
//! Variants map onto the failure classes a crawl distinguishes: fetching a
//! resource, parsing a document, reading an archive, finding the text member
//! and decoding it. The pipeline decides which of these are fatal.

use std::path::PathBuf;

use thiserror::Error;

use crate::zip::ArchiveError;

/// Errors raised while scanning, resolving or extracting catalog items.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Transport-level failure (DNS, connect, TLS, timeout, body read).
    #[error("network error fetching {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// The response body is larger than the configured cap.
    #[error("{url} is {size} bytes, over the {limit} byte limit")]
    TooLarge { url: String, size: u64, limit: u64 },

    /// The response could not be read as a markup document.
    #[error("cannot parse {url} as a document: {reason}")]
    Parse { url: String, reason: String },

    /// A link or input could not be turned into an absolute URL.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A configured selector or pattern does not compile.
    #[error("invalid site layout {what}: {reason}")]
    Layout { what: &'static str, reason: String },

    /// The downloaded bytes are not a readable archive.
    #[error("{url} is not a readable archive: {source}")]
    ArchiveFormat {
        url: String,
        #[source]
        source: ArchiveError,
    },

    /// No archive member carries the text extension.
    #[error("no member ending in {extension} in {url}")]
    MemberNotFound { url: String, extension: String },

    /// The text member holds byte sequences that are not Shift_JIS.
    #[error("{member} is not valid Shift_JIS text")]
    Decode { member: String },

    /// A local archive could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CollectorError {
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    pub fn parse(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn archive(url: impl Into<String>, source: ArchiveError) -> Self {
        Self::ArchiveFormat {
            url: url.into(),
            source,
        }
    }

    /// Whether the error came from retrieving a resource rather than
    /// interpreting it.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::HttpStatus { .. } | Self::TooLarge { .. }
        )
    }
}
