use thiserror::Error;

/// Reasons a byte buffer cannot be read as a ZIP archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("no End of Central Directory record found")]
    NotAnArchive,

    #[error("truncated archive: {0}")]
    Truncated(#[from] std::io::Error),

    #[error("invalid {0} signature")]
    BadSignature(&'static str),

    #[error("{name} uses unsupported compression method {method}")]
    UnsupportedMethod { name: String, method: u16 },

    #[error("{name} is encrypted")]
    Encrypted { name: String },

    #[error("{name} inflated to {actual} bytes, expected {expected}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("{name} failed its CRC-32 check")]
    ChecksumMismatch { name: String },

    #[error("{name} is not valid deflate data: {source}")]
    Inflate {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
