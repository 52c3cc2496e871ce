//! Reading stored archives back.
//!
//! The reader locates the end of central directory record, loads the central
//! directory and extracts stored entries, verifying each CRC-32.

use crate::archive_common::ArchiveDescriptorReader;
pub use crate::archive_common::CentralDirectoryEnd;
use crate::constants::{
    CENTRAL_DIRECTORY_END_SIGNATURE, END_OF_CENTRAL_DIRECTORY_SEARCH_WINDOW,
    END_OF_CENTRAL_DIRECTORY_SIZE, FILE_HEADER_BASE_SIZE, LOCAL_FILE_HEADER_SIGNATURE, STORE,
};
use crate::error::ArchiveError;
use crate::types::ArchiveFileEntry;
use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher;
use std::fmt::{self, Display};
use std::io::{Read, Seek, SeekFrom};
use tracing::debug;

pub struct ArchiveReader<R>
where
    R: Read + Seek,
{
    reader: R,
    pub file_entries: Vec<ArchiveFileEntry>,
    pub central_directory_end: CentralDirectoryEnd,
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn new(mut reader: R) -> Result<ArchiveReader<R>, ArchiveError> {
        let (central_directory_end, file_entries) = Self::parse(&mut reader)?;

        Ok(ArchiveReader {
            reader,
            file_entries,
            central_directory_end,
        })
    }

    pub fn len(&self) -> usize {
        self.file_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_entries.is_empty()
    }

    fn parse(reader: &mut R) -> Result<(CentralDirectoryEnd, Vec<ArchiveFileEntry>), ArchiveError> {
        let position = Self::find_central_directory_end(reader)?;
        let file_length = reader.seek(SeekFrom::End(0))?;

        reader.seek(SeekFrom::Start(position + 4))?;
        let mut central_end_buffer = vec![0; (file_length - position - 4) as usize];
        reader.read_exact(&mut central_end_buffer)?;

        let central_directory_end = CentralDirectoryEnd::parse(&central_end_buffer)?;
        debug!(?central_directory_end, "central directory end parsed");

        let file_entries = Self::read_central_directory(&central_directory_end, reader)?;

        Ok((central_directory_end, file_entries))
    }

    /// Scan backward from the end of the archive for the end of central directory signature.
    fn find_central_directory_end(reader: &mut R) -> Result<u64, ArchiveError> {
        let file_length = reader.seek(SeekFrom::End(0))?;

        let mut position = file_length
            .checked_sub(END_OF_CENTRAL_DIRECTORY_SIZE as u64)
            .ok_or_else(|| ArchiveError::BadArchiveStructure("Archive too small".to_owned()))?;

        let search_lower_bound = file_length.saturating_sub(END_OF_CENTRAL_DIRECTORY_SEARCH_WINDOW);

        loop {
            reader.seek(SeekFrom::Start(position))?;

            if reader.read_u32::<LittleEndian>()? == CENTRAL_DIRECTORY_END_SIGNATURE {
                debug!(position, "end of central directory found");
                return Ok(position);
            }

            if position <= search_lower_bound {
                return Err(ArchiveError::BadArchiveStructure(
                    "end of central directory signature not found".to_owned(),
                ));
            }
            position -= 1;
        }
    }

    fn read_central_directory(
        central_directory_end: &CentralDirectoryEnd,
        reader: &mut R,
    ) -> Result<Vec<ArchiveFileEntry>, ArchiveError> {
        reader.seek(SeekFrom::Start(
            central_directory_end.offset_of_start_of_central_directory as u64,
        ))?;

        let mut central_directory_buffer: Vec<u8> =
            vec![0; central_directory_end.central_directory_size as usize];
        reader.read_exact(&mut central_directory_buffer)?;

        let number_of_entries =
            central_directory_end.total_number_of_entries_in_the_central_directory as usize;
        let mut indexer = ArchiveDescriptorReader::new();
        let mut file_entries = Vec::with_capacity(number_of_entries);

        for _ in 0..number_of_entries {
            file_entries.push(indexer.read_central_directory_entry(&central_directory_buffer)?);
        }

        if indexer.get_index() != central_directory_buffer.len() {
            return Err(ArchiveError::BadArchiveStructure(format!(
                "central directory holds {} bytes, {} entries use {}",
                central_directory_buffer.len(),
                number_of_entries,
                indexer.get_index()
            )));
        }

        Ok(file_entries)
    }

    /// Read the content of the entry at `index` in central directory order.
    pub fn read_entry(&mut self, index: usize) -> Result<Vec<u8>, ArchiveError> {
        let entry = self.file_entries.get(index).ok_or_else(|| {
            ArchiveError::BadArchiveStructure(format!(
                "no entry at index {}, the archive has {}",
                index,
                self.file_entries.len()
            ))
        })?;

        if entry.compression_method != STORE {
            return Err(ArchiveError::UnsupportedCompressionMethod(
                entry.compression_method,
            ));
        }

        self.reader.seek(SeekFrom::Start(entry.offset as u64))?;

        let mut file_header = [0u8; FILE_HEADER_BASE_SIZE];
        self.reader.read_exact(&mut file_header)?;

        let mut indexer = ArchiveDescriptorReader::new();
        let signature = indexer.read_u32(&file_header)?;
        if signature != LOCAL_FILE_HEADER_SIGNATURE {
            return Err(ArchiveError::BadArchiveStructure(format!(
                "local file header signature expected at offset {}, found {:#010x}",
                entry.offset, signature
            )));
        }

        // name length and extra field length close the fixed part of the header
        let mut tail = &file_header[FILE_HEADER_BASE_SIZE - 4..];
        let file_name_len = tail.read_u16::<LittleEndian>()?;
        let extra_field_length = tail.read_u16::<LittleEndian>()?;

        self.reader.seek(SeekFrom::Current(
            file_name_len as i64 + extra_field_length as i64,
        ))?;

        let mut content = vec![0; entry.compressed_size as usize];
        self.reader.read_exact(&mut content)?;

        let mut hasher = Hasher::new();
        hasher.update(&content);
        let actual = hasher.finalize();

        if actual != entry.crc32 {
            return Err(ArchiveError::CrcMismatch {
                name: entry.get_file_name(),
                expected: entry.crc32,
                actual,
            });
        }

        Ok(content)
    }

    /// Names and contents of every entry, in central directory order.
    pub fn extract_all(&mut self) -> Result<Vec<(String, Vec<u8>)>, ArchiveError> {
        (0..self.file_entries.len())
            .map(|index| {
                let content = self.read_entry(index)?;
                Ok((self.file_entries[index].get_file_name(), content))
            })
            .collect()
    }
}

impl<R: Read + Seek> Display for ArchiveReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Archive: {} entries, central directory of {} bytes at offset {}",
            self.central_directory_end
                .total_number_of_entries_in_the_central_directory,
            self.central_directory_end.central_directory_size,
            self.central_directory_end.offset_of_start_of_central_directory
        )?;

        for entry in &self.file_entries {
            writeln!(f)?;
            write!(f, "{}", entry)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::{DateTimeCS, FileDateTime};
    use crate::{create_zip, ZipEntry};
    use std::io::Cursor;

    fn sample_archive() -> Vec<u8> {
        let time = FileDateTime::Custom(
            DateTimeCS::from_date_and_time(2022, 3, 4, 5, 6, 8).unwrap(),
        );
        create_zip(&[
            ZipEntry::new("first.txt", b"first".as_ref()).modified_time(time),
            ZipEntry::new("second.bin", vec![0u8, 1, 2, 3]).modified_time(time),
        ])
        .unwrap()
    }

    #[test]
    fn read_back() {
        let mut archive = ArchiveReader::new(Cursor::new(sample_archive())).unwrap();

        assert_eq!(archive.len(), 2);
        assert_eq!(
            archive.extract_all().unwrap(),
            vec![
                ("first.txt".to_owned(), b"first".to_vec()),
                ("second.bin".to_owned(), vec![0u8, 1, 2, 3]),
            ]
        );
        assert_eq!(
            archive.file_entries[1].last_modified(),
            DateTimeCS::from_date_and_time(2022, 3, 4, 5, 6, 8).unwrap()
        );
    }

    #[test]
    fn detects_corruption() {
        let mut bytes = sample_archive();
        // first byte of "first"
        bytes[30 + "first.txt".len()] ^= 0xFF;

        let mut archive = ArchiveReader::new(Cursor::new(bytes)).unwrap();

        assert!(matches!(
            archive.read_entry(0),
            Err(ArchiveError::CrcMismatch { .. })
        ));
        assert_eq!(archive.read_entry(1).unwrap(), vec![0u8, 1, 2, 3]);
    }

    #[test]
    fn rejects_truncated_archive() {
        let bytes = sample_archive();

        assert!(matches!(
            ArchiveReader::new(Cursor::new(&bytes[..10])),
            Err(ArchiveError::BadArchiveStructure(_))
        ));
        assert!(ArchiveReader::new(Cursor::new(&bytes[..bytes.len() - 1])).is_err());
    }

    #[test]
    fn empty_archive() {
        let archive = ArchiveReader::new(Cursor::new(create_zip(&[]).unwrap())).unwrap();

        assert!(archive.is_empty());
        assert_eq!(archive.central_directory_end.central_directory_size, 0);
        assert_eq!(
            archive
                .central_directory_end
                .offset_of_start_of_central_directory,
            0
        );
    }

    #[test]
    fn display_lists_entries() {
        let archive = ArchiveReader::new(Cursor::new(sample_archive())).unwrap();
        let listing = archive.to_string();

        assert!(listing.starts_with("Archive: 2 entries"));
        assert!(listing.contains("first.txt"));
        assert!(listing.contains("none (stored)"));
        assert!(listing.contains("2022-03-04 05:06:08"));
    }
}
