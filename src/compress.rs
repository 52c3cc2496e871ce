//! Archive writers.
//!
//! Every entry is written with compression method 0 (stored): the local file
//! header carries the final CRC-32 and sizes, so no data descriptor and no
//! seeking is ever needed. The resulting layout is
//!
//! ```text
//! [local file header 1][name 1][data 1] ... [local file header n][name n][data n]
//! [central directory header 1][name 1] ... [central directory header n][name n]
//! [end of central directory record]
//! ```
//!
//! Only the classic format is produced: names are limited to 65535 bytes, entries
//! and offsets to 32 bits and the archive to 65534 entries. Inputs beyond those
//! limits are rejected with an [`ArchiveError`] before anything is written for them.

#[cfg(feature = "tokio")]
pub mod tokio;

pub mod std;

pub(crate) mod common;

use ::std::borrow::Cow;

use crate::{
    compress::{common::validate_entries, std::archive::ZipArchive},
    constants::MAX_CLASSIC_ENTRIES,
    error::ArchiveError,
    tools::archive_size,
    types::FileDateTime,
};

/// Metadata for a file to be archived
#[derive(Clone, Debug, Default)]
pub struct FileOptions {
    /// The file modified time.
    pub last_modified_time: FileDateTime,
}

impl FileOptions {
    /// Set the last modified time
    ///
    /// The default is the current timestamp
    pub fn last_modified_time(mut self, mod_time: FileDateTime) -> FileOptions {
        self.last_modified_time = mod_time;
        self
    }
}

/// A named, fully materialized file to put in an archive.
#[derive(Clone, Debug)]
pub struct ZipEntry<'a> {
    /// Relative path recorded in the archive, written as UTF-8.
    pub name: Cow<'a, str>,
    /// Raw file content.
    pub data: Cow<'a, [u8]>,
    /// `None` means the local time when the entry is written.
    pub modified_time: Option<FileDateTime>,
}

impl<'a> ZipEntry<'a> {
    pub fn new(name: impl Into<Cow<'a, str>>, data: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            modified_time: None,
        }
    }

    pub fn modified_time(mut self, modified_time: impl Into<FileDateTime>) -> Self {
        self.modified_time = Some(modified_time.into());
        self
    }

    fn options(&self) -> FileOptions {
        FileOptions::default().last_modified_time(self.modified_time.unwrap_or_default())
    }
}

/// Build a complete stored Zip archive in memory.
///
/// Entries appear in the archive in the given order; duplicate names are kept
/// as they are. An empty slice gives the 22 bytes of an empty archive.
///
/// ```
/// use storezip::{create_zip, ZipEntry};
///
/// let archive = create_zip(&[
///     ZipEntry::new("hello.txt", b"hello\n".as_ref()),
///     ZipEntry::new("world.txt", b"world\n".to_vec()),
/// ])?;
///
/// assert_eq!(&archive[..4], b"PK\x03\x04");
/// # Ok::<(), storezip::error::ArchiveError>(())
/// ```
pub fn create_zip(entries: &[ZipEntry]) -> Result<Vec<u8>, ArchiveError> {
    if entries.len() > MAX_CLASSIC_ENTRIES {
        return Err(ArchiveError::TooManyEntries {
            count: entries.len(),
        });
    }

    let files = || {
        entries
            .iter()
            .map(|entry| (entry.name.as_ref(), entry.data.len()))
    };

    // nothing is reserved for a list that would be rejected halfway
    validate_entries(files())?;
    let capacity = usize::try_from(archive_size(files())).unwrap_or_default();

    let mut archive = ZipArchive::new(Vec::with_capacity(capacity));
    for entry in entries {
        archive.append(&entry.name, &entry.options(), &entry.data)?;
    }

    let (_, buffer) = archive.finalize()?;
    Ok(buffer)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::DateTimeCS;

    fn fixed_time() -> FileDateTime {
        FileDateTime::Custom(DateTimeCS::from_date_and_time(2023, 6, 15, 13, 45, 30).unwrap())
    }

    #[test]
    fn empty_archive() {
        let archive = create_zip(&[]).unwrap();

        assert_eq!(
            archive,
            vec![
                0x50, 0x4b, 0x05, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn single_entry_layout() {
        let entries = [ZipEntry::new("abc.txt", b"abc".as_ref()).modified_time(fixed_time())];
        let archive = create_zip(&entries).unwrap();

        let local = &archive[..30];
        assert_eq!(&local[..4], &[0x50, 0x4b, 0x03, 0x04]);
        assert_eq!(&local[4..6], &20u16.to_le_bytes()); // version needed
        assert_eq!(&local[6..8], &[0, 0]); // flags
        assert_eq!(&local[8..10], &[0, 0]); // stored
        assert_eq!(&local[10..12], &28079u16.to_le_bytes());
        assert_eq!(&local[12..14], &22223u16.to_le_bytes());
        assert_eq!(&local[14..18], &0x352441c2u32.to_le_bytes());
        assert_eq!(&local[18..22], &3u32.to_le_bytes());
        assert_eq!(&local[22..26], &3u32.to_le_bytes());
        assert_eq!(&local[26..28], &7u16.to_le_bytes());
        assert_eq!(&local[28..30], &[0, 0]);
        assert_eq!(&archive[30..37], b"abc.txt");
        assert_eq!(&archive[37..40], b"abc");

        let central = &archive[40..86];
        assert_eq!(&central[..4], &[0x50, 0x4b, 0x01, 0x02]);
        assert_eq!(&central[4..6], &20u16.to_le_bytes());
        assert_eq!(&central[6..8], &20u16.to_le_bytes());
        assert_eq!(&central[10..16], &local[8..14]);
        assert_eq!(&central[16..28], &local[14..26]);
        assert_eq!(&central[28..30], &7u16.to_le_bytes());
        assert_eq!(&central[30..42], &[0u8; 12]);
        assert_eq!(&central[42..46], &0u32.to_le_bytes());
        assert_eq!(&archive[86..93], b"abc.txt");

        let end = &archive[93..];
        assert_eq!(end.len(), 22);
        assert_eq!(&end[..4], &[0x50, 0x4b, 0x05, 0x06]);
        assert_eq!(&end[8..10], &1u16.to_le_bytes());
        assert_eq!(&end[10..12], &1u16.to_le_bytes());
        assert_eq!(&end[12..16], &53u32.to_le_bytes());
        assert_eq!(&end[16..20], &40u32.to_le_bytes());
        assert_eq!(&end[20..22], &[0, 0]);
    }

    #[test]
    fn name_too_long() {
        let name = "é".repeat(40_000);
        let entries = [ZipEntry::new(name, b"x".as_ref())];

        match create_zip(&entries) {
            Err(ArchiveError::FileNameTooLong { name_len }) => assert_eq!(name_len, 80_000),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn later_invalid_entry_rejects_whole_list() {
        let long_name = "n".repeat(u16::MAX as usize + 1);
        let entries = [
            ZipEntry::new("a.png", b"a".as_ref()),
            ZipEntry::new(long_name.as_str(), b"".as_ref()),
        ];

        match create_zip(&entries) {
            Err(ArchiveError::FileNameTooLong { name_len }) => {
                assert_eq!(name_len, u16::MAX as usize + 1)
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn longest_name_accepted() {
        let name = "n".repeat(u16::MAX as usize);
        let entries = [ZipEntry::new(name.as_str(), b"x".as_ref()).modified_time(fixed_time())];

        let archive = create_zip(&entries).unwrap();
        assert_eq!(&archive[26..28], &[0xFF, 0xFF]);
    }

    #[test]
    fn deterministic_with_fixed_time() {
        let entries = [
            ZipEntry::new("one", b"1".as_ref()).modified_time(fixed_time()),
            ZipEntry::new("two", b"22".as_ref()).modified_time(FileDateTime::Zero),
        ];

        assert_eq!(create_zip(&entries).unwrap(), create_zip(&entries).unwrap());
    }
}
