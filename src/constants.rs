use std::mem::size_of;

pub const FILE_HEADER_BASE_SIZE: usize = 7 * size_of::<u16>() + 4 * size_of::<u32>();
pub const CENTRAL_DIRECTORY_ENTRY_BASE_SIZE: usize = 11 * size_of::<u16>() + 6 * size_of::<u32>();
pub const END_OF_CENTRAL_DIRECTORY_SIZE: usize = 5 * size_of::<u16>() + 3 * size_of::<u32>();

pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;
pub const CENTRAL_DIRECTORY_END_SIGNATURE: u32 = 0x06054b50;
pub const CENTRAL_DIRECTORY_ENTRY_SIGNATURE: u32 = 0x02014b50;

/// PKZIP 2.0, upper byte 0 (MS-DOS / FAT attribute compatibility).
pub const VERSION_MADE_BY: u16 = 20;
pub const VERSION_NEEDED_TO_EXTRACT: u16 = 20;

/// Compression method 0: the entry bytes are stored verbatim.
pub const STORE: u16 = 0;

/// Largest entry or archive offset a classic (non ZIP64) field can carry.
/// `0xFFFFFFFF` itself is reserved to signal a ZIP64 record.
pub const MAX_CLASSIC_SIZE: u64 = u32::MAX as u64 - 1;
/// `0xFFFF` is reserved to signal a ZIP64 record.
pub const MAX_CLASSIC_ENTRIES: usize = u16::MAX as usize - 1;
pub const MAX_FILE_NAME_LEN: usize = u16::MAX as usize;

/// Bytes scanned backward from the end of an archive when looking for the
/// end of central directory record (fixed record plus the longest comment).
pub const END_OF_CENTRAL_DIRECTORY_SEARCH_WINDOW: u64 =
    END_OF_CENTRAL_DIRECTORY_SIZE as u64 + u16::MAX as u64;

pub const ZIP_MIME_TYPE: &str = "application/zip";
