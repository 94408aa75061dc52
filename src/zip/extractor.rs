use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::{self, Read};
use std::sync::Arc;

use crate::io::ReadAt;

use super::error::ArchiveError;
use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Upper bound on buffer preallocation; a header can claim any size
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// ZIP member lookup and extraction
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all members in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>, ArchiveError> {
        self.parser.list_files().await
    }

    /// First file, in listing order, whose name ends with `suffix`
    pub async fn find_by_suffix(&self, suffix: &str) -> Result<Option<ZipFileEntry>, ArchiveError> {
        let entries = self.list_files().await?;
        Ok(entries.into_iter().find(|e| e.has_suffix(suffix)))
    }

    /// Decompress a member into memory, verifying its size and CRC-32
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>, ArchiveError> {
        if entry.is_encrypted() {
            return Err(ArchiveError::Encrypted {
                name: entry.file_name.clone(),
            });
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        let archive_size = self.parser.reader().size();
        if data_offset.saturating_add(entry.compressed_size) > archive_size {
            return Err(ArchiveError::Truncated(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} ends past byte {}", entry.file_name, archive_size),
            )));
        }

        let mut compressed = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut compressed)
            .await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => compressed,
            CompressionMethod::Deflate => inflate(entry, &compressed)?,
            CompressionMethod::Unknown(method) => {
                return Err(ArchiveError::UnsupportedMethod {
                    name: entry.file_name.clone(),
                    method,
                });
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(ArchiveError::SizeMismatch {
                name: entry.file_name.clone(),
                expected: entry.uncompressed_size,
                actual: data.len() as u64,
            });
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(ArchiveError::ChecksumMismatch {
                name: entry.file_name.clone(),
            });
        }

        Ok(data)
    }
}

fn inflate(entry: &ZipFileEntry, compressed: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut out = Vec::with_capacity(entry.uncompressed_size.min(MAX_PREALLOC) as usize);
    // one byte past the declared size is enough to detect an overrun
    DeflateDecoder::new(compressed)
        .take(entry.uncompressed_size.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|source| ArchiveError::Inflate {
            name: entry.file_name.clone(),
            source,
        })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::fixture::ZipBuilder;

    fn extractor(data: Vec<u8>) -> ZipExtractor<MemoryReader> {
        ZipExtractor::new(Arc::new(MemoryReader::new(data)))
    }

    #[tokio::test]
    async fn picks_first_exact_suffix_match() {
        let zip = extractor(
            ZipBuilder::new()
                .stored("meta.txt.bak", b"backup")
                .stored("readme.html", b"<p>")
                .stored("notes.txt/", b"")
                .stored("book.txt", b"book")
                .stored("later.txt", b"later")
                .finish(),
        );
        let entry = zip.find_by_suffix(".txt").await.unwrap().unwrap();
        assert_eq!(entry.file_name, "book.txt");
    }

    #[tokio::test]
    async fn no_match_is_none() {
        let zip = extractor(ZipBuilder::new().stored("readme.html", b"<p>").finish());
        assert!(zip.find_by_suffix(".txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn extracts_stored_and_deflated() {
        let body = "吾輩は猫である。名前はまだ無い。".repeat(40);
        let zip = extractor(
            ZipBuilder::new()
                .stored("stored.txt", body.as_bytes())
                .deflated("deflated.txt", body.as_bytes())
                .finish(),
        );
        for entry in zip.list_files().await.unwrap() {
            assert_eq!(zip.extract_to_memory(&entry).await.unwrap(), body.as_bytes());
        }
    }

    #[tokio::test]
    async fn corrupted_data_fails_crc() {
        let mut data = ZipBuilder::new().stored("a.txt", b"hello").finish();
        // first payload byte follows the 30-byte header and 5-byte name
        data[35] ^= 0xff;
        let zip = extractor(data);
        let entry = zip.find_by_suffix(".txt").await.unwrap().unwrap();
        let err = zip.extract_to_memory(&entry).await.unwrap_err();
        assert!(matches!(err, ArchiveError::ChecksumMismatch { .. }));
    }

    #[tokio::test]
    async fn unsupported_method_is_rejected() {
        let zip = extractor(ZipBuilder::new().stored("a.txt", b"hello").finish());
        let mut entry = zip.find_by_suffix(".txt").await.unwrap().unwrap();
        entry.compression_method = CompressionMethod::Unknown(12);
        let err = zip.extract_to_memory(&entry).await.unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedMethod { method: 12, .. }));
    }

    #[tokio::test]
    async fn encrypted_member_is_rejected() {
        let zip = extractor(ZipBuilder::new().stored("a.txt", b"hello").finish());
        let mut entry = zip.find_by_suffix(".txt").await.unwrap().unwrap();
        entry.flags |= crate::zip::FLAG_ENCRYPTED;
        let err = zip.extract_to_memory(&entry).await.unwrap_err();
        assert!(matches!(err, ArchiveError::Encrypted { .. }));
    }
}
