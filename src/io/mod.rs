mod http;
mod memory;

pub use http::{DEFAULT_MAX_BODY_BYTES, DEFAULT_TIMEOUT, HttpFetcher};
pub use memory::MemoryReader;

use async_trait::async_trait;
use std::io;

/// Random access over an archive's bytes
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read up to `buf.len()` bytes starting at `offset`, returning how many were read.
    ///
    /// Reading at or past the end yields `Ok(0)`.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Total size of the data source
    fn size(&self) -> u64;

    /// Fill `buf` completely from `offset`, failing with `UnexpectedEof` if
    /// the source ends first.
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "needed {} bytes at offset {}, source has {}",
                        buf.len(),
                        offset,
                        self.size()
                    ),
                ));
            }
            filled += n;
        }
        Ok(())
    }
}
