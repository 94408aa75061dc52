//! Archive extraction: download, pick the text member, decode it.

use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::config::SiteLayout;
use crate::error::CollectorError;
use crate::io::{HttpFetcher, MemoryReader, ReadAt};
use crate::text::decode_shift_jis;
use crate::zip::ZipExtractor;

/// Decoded text of one archive member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Name of the member the text came from
    pub member: String,
    pub text: String,
}

/// Download an archive in full and extract its text member.
pub async fn fetch_and_extract(
    fetcher: &HttpFetcher,
    layout: &SiteLayout,
    archive_url: &Url,
) -> Result<ExtractedText, CollectorError> {
    let data = fetcher.get_bytes(archive_url).await?;
    debug!(url = %archive_url, bytes = data.len(), "archive downloaded");
    let reader = Arc::new(MemoryReader::new(data));
    extract_text(reader, layout, archive_url.as_str()).await
}

/// Extract and decode the first member ending in the layout's text extension.
///
/// `source` names the archive in errors and logs.
pub async fn extract_text<R: ReadAt>(
    reader: Arc<R>,
    layout: &SiteLayout,
    source: &str,
) -> Result<ExtractedText, CollectorError> {
    let zip = ZipExtractor::new(reader);
    let extension = layout.text_extension();

    let entry = zip
        .find_by_suffix(extension)
        .await
        .map_err(|e| CollectorError::archive(source, e))?
        .ok_or_else(|| CollectorError::MemberNotFound {
            url: source.to_string(),
            extension: extension.to_string(),
        })?;

    let bytes = zip
        .extract_to_memory(&entry)
        .await
        .map_err(|e| CollectorError::archive(source, e))?;

    let text = decode_shift_jis(&bytes).ok_or_else(|| CollectorError::Decode {
        member: format!("{source}!{}", entry.file_name),
    })?;
    info!(archive = source, member = %entry.file_name, chars = text.chars().count(), "text extracted");

    Ok(ExtractedText {
        member: entry.file_name,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::zip::fixture::ZipBuilder;

    // 吾輩は猫である
    const NEKO_SJIS: &[u8] = &[
        0x8c, 0xe1, 0x94, 0x79, 0x82, 0xcd, 0x94, 0x4c, 0x82, 0xc5, 0x82, 0xa0, 0x82, 0xe9,
    ];

    fn layout() -> SiteLayout {
        SiteLayout::new(SiteConfig::default()).unwrap()
    }

    async fn extract(data: Vec<u8>) -> Result<ExtractedText, CollectorError> {
        extract_text(Arc::new(MemoryReader::new(data)), &layout(), "test.zip").await
    }

    #[tokio::test]
    async fn decodes_selected_member() {
        let data = ZipBuilder::new()
            .stored("meta.txt.bak", b"\xff\xff")
            .stored("readme.html", b"<p>")
            .deflated("book.txt", NEKO_SJIS)
            .finish();
        let extracted = extract(data).await.unwrap();
        assert_eq!(extracted.member, "book.txt");
        assert_eq!(extracted.text, "吾輩は猫である");
    }

    #[tokio::test]
    async fn missing_text_member() {
        let data = ZipBuilder::new().stored("readme.html", b"<p>").finish();
        let err = extract(data).await.unwrap_err();
        assert!(matches!(
            err,
            CollectorError::MemberNotFound { ref extension, .. } if extension == ".txt"
        ));
    }

    #[tokio::test]
    async fn malformed_shift_jis_fails() {
        let mut body = NEKO_SJIS.to_vec();
        body.extend_from_slice(&[0x82, 0x20, 0xff]);
        let data = ZipBuilder::new().stored("book.txt", &body).finish();
        let err = extract(data).await.unwrap_err();
        assert!(matches!(err, CollectorError::Decode { ref member } if member == "test.zip!book.txt"));
    }

    #[tokio::test]
    async fn garbage_is_an_archive_error() {
        let err = extract(b"<html>404</html>".to_vec()).await.unwrap_err();
        assert!(matches!(err, CollectorError::ArchiveFormat { .. }));
    }
}
