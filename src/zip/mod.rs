//! ZIP archive reading.
//!
//! Archives are read the way the format intends: the End of Central
//! Directory record is located at the tail, it points at the Central
//! Directory, and the Central Directory lists every member with its sizes,
//! checksum and the offset of its Local File Header.
//!
//! - [`structures`]: fixed records of the format and the parsed member entry
//! - [`parser`]: locating and decoding those records through [`ReadAt`](crate::io::ReadAt)
//! - [`extractor`]: member lookup and decompression
//! - [`listing`]: the member table printed by `extract -l`
//!
//! Stored and deflated members are supported, ZIP64 sizes included.
//! Encrypted members and other compression methods are rejected.

mod error;
mod extractor;
mod listing;
mod parser;
mod structures;

pub use error::ArchiveError;
pub use extractor::ZipExtractor;
pub use listing::write_member_table;
pub use parser::ZipParser;
pub use structures::*;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod fixture {
    //! Minimal ZIP writer for building test archives.

    use byteorder::{LittleEndian, WriteBytesExt};
    use flate2::Compression;
    use flate2::write::DeflateEncoder;
    use std::io::Write;

    #[derive(Default)]
    pub struct ZipBuilder {
        data: Vec<u8>,
        central: Vec<u8>,
        count: u16,
    }

    impl ZipBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn stored(self, name: &str, contents: &[u8]) -> Self {
            self.add(name, contents, false)
        }

        pub fn deflated(self, name: &str, contents: &[u8]) -> Self {
            self.add(name, contents, true)
        }

        pub fn add(mut self, name: &str, contents: &[u8], deflate: bool) -> Self {
            let mut crc = flate2::Crc::new();
            crc.update(contents);
            let crc = crc.sum();

            let (method, payload) = if deflate {
                let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
                enc.write_all(contents).unwrap();
                (8u16, enc.finish().unwrap())
            } else {
                (0u16, contents.to_vec())
            };

            let offset = self.data.len() as u32;
            let name = name.as_bytes();

            let d = &mut self.data;
            d.extend_from_slice(b"PK\x03\x04");
            d.write_u16::<LittleEndian>(20).unwrap();
            d.write_u16::<LittleEndian>(0x0800).unwrap();
            d.write_u16::<LittleEndian>(method).unwrap();
            d.write_u16::<LittleEndian>(0x6000).unwrap(); // 12:00:00
            d.write_u16::<LittleEndian>(0x5a21).unwrap(); // 2025-01-01
            d.write_u32::<LittleEndian>(crc).unwrap();
            d.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            d.write_u32::<LittleEndian>(contents.len() as u32).unwrap();
            d.write_u16::<LittleEndian>(name.len() as u16).unwrap();
            d.write_u16::<LittleEndian>(0).unwrap();
            d.extend_from_slice(name);
            d.extend_from_slice(&payload);

            let c = &mut self.central;
            c.extend_from_slice(b"PK\x01\x02");
            c.write_u16::<LittleEndian>(20).unwrap();
            c.write_u16::<LittleEndian>(20).unwrap();
            c.write_u16::<LittleEndian>(0x0800).unwrap();
            c.write_u16::<LittleEndian>(method).unwrap();
            c.write_u16::<LittleEndian>(0x6000).unwrap();
            c.write_u16::<LittleEndian>(0x5a21).unwrap();
            c.write_u32::<LittleEndian>(crc).unwrap();
            c.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            c.write_u32::<LittleEndian>(contents.len() as u32).unwrap();
            c.write_u16::<LittleEndian>(name.len() as u16).unwrap();
            c.write_u16::<LittleEndian>(0).unwrap();
            c.write_u16::<LittleEndian>(0).unwrap();
            c.write_u16::<LittleEndian>(0).unwrap();
            c.write_u16::<LittleEndian>(0).unwrap();
            c.write_u32::<LittleEndian>(0).unwrap();
            c.write_u32::<LittleEndian>(offset).unwrap();
            c.extend_from_slice(name);

            self.count += 1;
            self
        }

        pub fn finish(self) -> Vec<u8> {
            self.finish_with_comment(b"")
        }

        pub fn finish_with_comment(mut self, comment: &[u8]) -> Vec<u8> {
            let cd_offset = self.data.len() as u32;
            let cd_size = self.central.len() as u32;
            self.data.extend_from_slice(&self.central);

            let d = &mut self.data;
            d.extend_from_slice(b"PK\x05\x06");
            d.write_u16::<LittleEndian>(0).unwrap();
            d.write_u16::<LittleEndian>(0).unwrap();
            d.write_u16::<LittleEndian>(self.count).unwrap();
            d.write_u16::<LittleEndian>(self.count).unwrap();
            d.write_u32::<LittleEndian>(cd_size).unwrap();
            d.write_u32::<LittleEndian>(cd_offset).unwrap();
            d.write_u16::<LittleEndian>(comment.len() as u16).unwrap();
            d.extend_from_slice(comment);
            self.data
        }
    }
}
