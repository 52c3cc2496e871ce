//! Errors raised while building, reading or feeding an archive.

/// Everything that can go wrong in this crate.
///
/// Limit errors ([`FileNameTooLong`](ArchiveError::FileNameTooLong),
/// [`EntryTooLarge`](ArchiveError::EntryTooLarge),
/// [`ArchiveTooLarge`](ArchiveError::ArchiveTooLarge),
/// [`TooManyEntries`](ArchiveError::TooManyEntries)) are input errors: retrying
/// with the same input fails the same way.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The UTF-8 encoded file name does not fit the 16-bit length field.
    #[error("file name is {name_len} bytes long, the limit is 65535 bytes")]
    FileNameTooLong { name_len: usize },

    /// The entry payload does not fit the 32-bit size fields.
    #[error("entry '{name}' is {size} bytes long, larger than a non ZIP64 archive supports")]
    EntryTooLarge { name: String, size: u64 },

    /// An offset or the central directory size does not fit its 32-bit field.
    #[error("archive grows to {size} bytes, larger than a non ZIP64 archive supports")]
    ArchiveTooLarge { size: u64 },

    #[error("{count} entries exceed the 65534 entries a non ZIP64 archive supports")]
    TooManyEntries { count: usize },

    #[error("the compression method code '{0}' is not supported")]
    UnsupportedCompressionMethod(u16),

    #[error("bad archive structure : {0}")]
    BadArchiveStructure(String),

    #[error("CRC-32 mismatch for '{name}': expected {expected:08x}, got {actual:08x}")]
    CrcMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[cfg(feature = "tokio")]
    #[error("decoding task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ArchiveError {
    /// Returns true when the error comes from the non ZIP64 format limits.
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(
            self,
            Self::FileNameTooLong { .. }
                | Self::EntryTooLarge { .. }
                | Self::ArchiveTooLarge { .. }
                | Self::TooManyEntries { .. }
        )
    }
}
