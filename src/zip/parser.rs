//! Locating and decoding ZIP records.
//!
//! Parsing works backwards from the end of the archive:
//! 1. find the End of Central Directory (EOCD), allowing for a trailing comment
//! 2. follow the ZIP64 locator when the EOCD fields are saturated
//! 3. read the Central Directory and decode one entry per member
//!
//! Member data is located lazily through its Local File Header, whose
//! variable-length fields may differ from the Central Directory copy.

use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::SHIFT_JIS;
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;

use super::error::ArchiveError;
use super::structures::*;

/// Maximum ZIP comment size allowed by the format
const MAX_COMMENT_SIZE: u64 = 65535;

/// ZIP64 extended information extra field
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Reads ZIP structures from any [`ReadAt`] source.
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find the EOCD record and its offset.
    ///
    /// The record sits at the very end unless the archive has a comment, in
    /// which case the tail is searched backwards for a signature whose
    /// comment length reaches exactly to the end of the file.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64), ArchiveError> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if self.size < eocd_size {
            return Err(ArchiveError::NotAnArchive);
        }

        let offset = self.size - eocd_size;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_exact_at(offset, &mut buf).await?;
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE {
            let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
            if eocd.comment_len == 0 {
                return Ok((eocd, offset));
            }
        }

        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;
        let mut tail = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut tail).await?;

        for i in (0..=tail.len() - EndOfCentralDirectory::SIZE).rev() {
            if &tail[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            let eocd =
                EndOfCentralDirectory::from_bytes(&tail[i..i + EndOfCentralDirectory::SIZE])?;
            if eocd.comment_len as usize == tail.len() - i - EndOfCentralDirectory::SIZE {
                return Ok((eocd, search_start + i as u64));
            }
        }

        Err(ArchiveError::NotAnArchive)
    }

    /// Read the ZIP64 EOCD through the locator that precedes the EOCD
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD, ArchiveError> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or(ArchiveError::BadSignature("ZIP64 locator"))?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader
            .read_exact_at(locator_offset, &mut locator_buf)
            .await?;
        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;
        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// List every member in Central Directory order
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>, ArchiveError> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.saturating_add(cd_size) > self.size {
            return Err(ArchiveError::Truncated(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("central directory ends past byte {}", self.size),
            )));
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data).await?;

        let capacity = total_entries.min(cd_size / CDFH_MIN_SIZE as u64) as usize;
        let mut entries = Vec::with_capacity(capacity);
        let mut cursor = Cursor::new(cd_data.as_slice());
        for _ in 0..total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Offset of a member's data, just past its Local File Header
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64, ArchiveError> {
        let mut lfh = vec![0u8; LFH_SIZE];
        self.reader.read_exact_at(entry.lfh_offset, &mut lfh).await?;
        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(ArchiveError::BadSignature("Local File Header"));
        }

        let mut cursor = Cursor::new(&lfh[26..]);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry, ArchiveError> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(ArchiveError::BadSignature("Central Directory File Header"));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut name_bytes)?;
    let file_name = decode_name(&name_bytes, flags);
    let is_directory = file_name.ends_with('/');

    let extra_end = cursor.position() + extra_field_length as u64;
    while cursor.position() + 4 <= extra_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()? as u64;
        let field_end = cursor.position() + field_size;

        if header_id == ZIP64_EXTRA_ID {
            // Only the saturated header fields are present, in this order
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }
        cursor.set_position(field_end);
    }
    cursor.set_position(extra_end + file_comment_length as u64);

    Ok(ZipFileEntry {
        file_name,
        flags,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        last_mod_time,
        last_mod_date,
        is_directory,
    })
}

/// Member names without the UTF-8 flag are in the archiver's locale, which
/// for this catalog means Shift_JIS.
fn decode_name(bytes: &[u8], flags: u16) -> String {
    if flags & FLAG_UTF8 != 0 || bytes.is_ascii() {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let (name, _, _) = SHIFT_JIS.decode(bytes);
    name.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::fixture::ZipBuilder;

    fn parser(data: Vec<u8>) -> ZipParser<MemoryReader> {
        ZipParser::new(Arc::new(MemoryReader::new(data)))
    }

    #[tokio::test]
    async fn lists_members_in_order() {
        let data = ZipBuilder::new()
            .stored("cocoro/", b"")
            .stored("cocoro/readme.html", b"<p>")
            .deflated("cocoro/kokoro.txt", b"text")
            .finish();
        let entries = parser(data).list_files().await.unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["cocoro/", "cocoro/readme.html", "cocoro/kokoro.txt"]);
        assert!(entries[0].is_directory);
        assert_eq!(entries[2].compression_method, CompressionMethod::Deflate);
        assert_eq!(entries[2].uncompressed_size, 4);
        assert_eq!(entries[2].mod_date(), (2025, 1, 1));
        assert_eq!(entries[2].mod_time(), (12, 0, 0));
    }

    #[tokio::test]
    async fn finds_eocd_behind_comment() {
        let data = ZipBuilder::new()
            .stored("a.txt", b"a")
            .finish_with_comment(b"archived by the catalog");
        let entries = parser(data).list_files().await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn empty_archive_has_no_members() {
        let data = ZipBuilder::new().finish();
        assert!(parser(data).list_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_archive() {
        let err = parser(b"<html>not found</html>".to_vec())
            .list_files()
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::NotAnArchive));

        let err = parser(b"PK".to_vec()).list_files().await.unwrap_err();
        assert!(matches!(err, ArchiveError::NotAnArchive));
    }

    #[tokio::test]
    async fn rejects_truncated_central_directory() {
        let mut data = ZipBuilder::new().stored("a.txt", b"abc").finish();
        // point the central directory past the end of the buffer
        let len = data.len();
        data[len - 6..len - 2].copy_from_slice(&0x7fff_0000u32.to_le_bytes());
        let err = parser(data).list_files().await.unwrap_err();
        assert!(matches!(err, ArchiveError::Truncated(_)));
    }

    #[test]
    fn legacy_names_are_shift_jis() {
        // こころ.txt
        let bytes = [0x82, 0xb1, 0x82, 0xb1, 0x82, 0xeb, b'.', b't', b'x', b't'];
        assert_eq!(decode_name(&bytes, 0), "こころ.txt");
        assert_eq!(decode_name(b"plain.txt", 0), "plain.txt");
    }
}
