use crate::archive_common::{ArchiveDescriptor, CentralDirectoryEnd};
use crate::compress::FileOptions;
use crate::constants::{
    CENTRAL_DIRECTORY_ENTRY_BASE_SIZE, CENTRAL_DIRECTORY_ENTRY_SIGNATURE,
    END_OF_CENTRAL_DIRECTORY_SIZE, FILE_HEADER_BASE_SIZE, LOCAL_FILE_HEADER_SIGNATURE,
    MAX_CLASSIC_ENTRIES, MAX_CLASSIC_SIZE, MAX_FILE_NAME_LEN, STORE, VERSION_MADE_BY,
    VERSION_NEEDED_TO_EXTRACT,
};
use crate::crc::crc32;
use crate::error::ArchiveError;
use crate::types::ArchiveFileEntry;

/// State shared by the sync and async writers: the entries written so far
/// and the number of bytes emitted.
#[derive(Debug, Default)]
pub struct SubZipArchiveData {
    files_info: Vec<ArchiveFileEntry>,
    pub archive_size: u64,
}

impl SubZipArchiveData {
    pub fn add_archive_file_entry(&mut self, archive_file_entry: ArchiveFileEntry) {
        self.files_info.push(archive_file_entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchiveFileEntry> {
        self.files_info.iter()
    }

    pub fn len(&self) -> usize {
        self.files_info.len()
    }
}

fn classic_size(size: u64) -> Result<u32, ArchiveError> {
    if size > MAX_CLASSIC_SIZE {
        return Err(ArchiveError::ArchiveTooLarge { size });
    }
    Ok(size as u32)
}

/// Check that one more entry still fits the classic format.
pub fn validate_entry(
    file_name: &str,
    payload_len: usize,
    data: &SubZipArchiveData,
) -> Result<(), ArchiveError> {
    check_entry(file_name, payload_len, data.len(), data.archive_size).map(|_| ())
}

/// Check a whole list of entries up front, without writing or allocating anything.
pub fn validate_entries<'a, I>(files: I) -> Result<(), ArchiveError>
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let mut offset = 0;
    for (count, (file_name, payload_len)) in files.into_iter().enumerate() {
        offset = check_entry(file_name, payload_len, count, offset)?;
    }

    Ok(())
}

/// Returns the offset right after the entry.
fn check_entry(
    file_name: &str,
    payload_len: usize,
    entries_before: usize,
    offset: u64,
) -> Result<u64, ArchiveError> {
    let name_len = file_name.len();
    if name_len > MAX_FILE_NAME_LEN {
        return Err(ArchiveError::FileNameTooLong { name_len });
    }

    let size = payload_len as u64;
    if size > MAX_CLASSIC_SIZE {
        return Err(ArchiveError::EntryTooLarge {
            name: file_name.to_owned(),
            size,
        });
    }

    if entries_before >= MAX_CLASSIC_ENTRIES {
        return Err(ArchiveError::TooManyEntries {
            count: entries_before + 1,
        });
    }

    // the central directory starts after this entry, its offset must fit too
    let entry_end = offset + (FILE_HEADER_BASE_SIZE + name_len) as u64 + size;
    classic_size(entry_end).map(u64::from)
}

/// Build the local file header of a stored entry.
///
/// The CRC-32 and sizes are final since the payload is known up front.
pub fn build_file_header(
    file_name: &str,
    options: &FileOptions,
    payload: &[u8],
    file_header_offset: u64,
) -> Result<(ArchiveDescriptor, ArchiveFileEntry), ArchiveError> {
    let file_name_as_bytes = file_name.as_bytes().to_owned();
    let (last_mod_file_date, last_mod_file_time) = options.last_modified_time.ms_dos();
    let size = payload.len() as u32;

    let archive_file_entry = ArchiveFileEntry {
        version_made_by: VERSION_MADE_BY,
        version_needed: VERSION_NEEDED_TO_EXTRACT,
        general_purpose_flags: 0,
        compression_method: STORE,
        last_mod_file_time,
        last_mod_file_date,
        crc32: crc32(payload),
        compressed_size: size,
        uncompressed_size: size,
        file_name_as_bytes,
        extra_field_length: 0,
        file_comment_length: 0,
        internal_file_attributes: 0,
        external_file_attributes: 0,
        offset: classic_size(file_header_offset)?,
    };

    let mut file_header = ArchiveDescriptor::new(FILE_HEADER_BASE_SIZE + file_name.len());
    file_header.write_u32(LOCAL_FILE_HEADER_SIGNATURE);
    file_header.write_u16(archive_file_entry.version_needed);
    file_header.write_u16(archive_file_entry.general_purpose_flags);
    file_header.write_u16(archive_file_entry.compression_method);
    file_header.write_u16(archive_file_entry.last_mod_file_time);
    file_header.write_u16(archive_file_entry.last_mod_file_date);
    file_header.write_u32(archive_file_entry.crc32);
    file_header.write_u32(archive_file_entry.compressed_size);
    file_header.write_u32(archive_file_entry.uncompressed_size);
    file_header.write_u16(archive_file_entry.file_name_len());
    file_header.write_u16(archive_file_entry.extra_field_length);
    file_header.write_bytes(&archive_file_entry.file_name_as_bytes);

    Ok((file_header, archive_file_entry))
}

pub fn build_central_directory_file_header(
    central_directory_header: &mut ArchiveDescriptor,
    file_info: &ArchiveFileEntry,
) {
    central_directory_header.write_u32(CENTRAL_DIRECTORY_ENTRY_SIGNATURE);
    central_directory_header.write_u16(file_info.version_made_by);
    central_directory_header.write_u16(file_info.version_needed);
    central_directory_header.write_u16(file_info.general_purpose_flags);
    central_directory_header.write_u16(file_info.compression_method);
    central_directory_header.write_u16(file_info.last_mod_file_time);
    central_directory_header.write_u16(file_info.last_mod_file_date);
    central_directory_header.write_u32(file_info.crc32);
    central_directory_header.write_u32(file_info.compressed_size);
    central_directory_header.write_u32(file_info.uncompressed_size);
    central_directory_header.write_u16(file_info.file_name_len());
    central_directory_header.write_u16(file_info.extra_field_length);
    central_directory_header.write_u16(file_info.file_comment_length);
    central_directory_header.write_u16(0); // disk number start
    central_directory_header.write_u16(file_info.internal_file_attributes);
    central_directory_header.write_u32(file_info.external_file_attributes);
    central_directory_header.write_u32(file_info.offset);
    central_directory_header.write_bytes(&file_info.file_name_as_bytes);
}

/// Size of the whole central directory for the entries written so far.
pub fn central_directory_size(data: &SubZipArchiveData) -> usize {
    data.iter()
        .map(|file_info| CENTRAL_DIRECTORY_ENTRY_BASE_SIZE + file_info.file_name_as_bytes.len())
        .sum()
}

pub fn build_central_directory_end(
    data: &SubZipArchiveData,
    central_directory_offset: u64,
    central_directory_size: u64,
) -> Result<ArchiveDescriptor, ArchiveError> {
    let number_of_entries = u16::try_from(data.len())
        .map_err(|_| ArchiveError::TooManyEntries { count: data.len() })?;

    let central_directory_end = CentralDirectoryEnd::new(
        number_of_entries,
        classic_size(central_directory_size)?,
        classic_size(central_directory_offset)?,
    );

    let mut end_of_central_directory = ArchiveDescriptor::new(END_OF_CENTRAL_DIRECTORY_SIZE);
    central_directory_end.create_end_of_central_directory(&mut end_of_central_directory);

    Ok(end_of_central_directory)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::FileDateTime;

    #[test]
    fn validate_limits() {
        let data = SubZipArchiveData::default();

        assert!(validate_entry("a.png", 10, &data).is_ok());
        assert!(matches!(
            validate_entry(&"x".repeat(MAX_FILE_NAME_LEN + 1), 0, &data),
            Err(ArchiveError::FileNameTooLong { .. })
        ));
    }

    #[test]
    fn validate_entry_too_large() {
        let data = SubZipArchiveData::default();

        match validate_entry("big.png", MAX_CLASSIC_SIZE as usize + 1, &data) {
            Err(ArchiveError::EntryTooLarge { name, size }) => {
                assert_eq!(name, "big.png");
                assert_eq!(size, MAX_CLASSIC_SIZE + 1);
            }
            other => panic!("unexpected result {:?}", other),
        }

        // the largest payload fits its size fields, but not behind its own header
        assert!(matches!(
            validate_entry("big.png", MAX_CLASSIC_SIZE as usize, &data),
            Err(ArchiveError::ArchiveTooLarge { .. })
        ));
    }

    #[test]
    fn validate_entries_up_front() {
        assert!(validate_entries([("a.png", 10), ("b.png", 0)]).is_ok());
        assert!(validate_entries(std::iter::empty()).is_ok());

        assert!(matches!(
            validate_entries([("a.png", 10), ("big.png", usize::MAX)]),
            Err(ArchiveError::EntryTooLarge { .. })
        ));

        // each entry fits alone, the second one ends past the 32-bit offsets
        let half = (MAX_CLASSIC_SIZE / 2) as usize;
        assert!(matches!(
            validate_entries([("a", half), ("b", half)]),
            Err(ArchiveError::ArchiveTooLarge { .. })
        ));
    }

    #[test]
    fn validate_archive_offset() {
        let data = SubZipArchiveData {
            archive_size: MAX_CLASSIC_SIZE - 40,
            ..Default::default()
        };

        assert!(validate_entry("a", 9, &data).is_ok());
        assert!(matches!(
            validate_entry("a", 10, &data),
            Err(ArchiveError::ArchiveTooLarge { .. })
        ));
    }

    #[test]
    fn validate_entry_count() {
        let mut data = SubZipArchiveData::default();
        let (_, entry) =
            build_file_header("e", &FileOptions::default(), b"", 0).unwrap();
        for _ in 0..MAX_CLASSIC_ENTRIES {
            data.add_archive_file_entry(entry.clone());
        }

        assert!(matches!(
            validate_entry("e", 0, &data),
            Err(ArchiveError::TooManyEntries { count }) if count == MAX_CLASSIC_ENTRIES + 1
        ));
    }

    #[test]
    fn header_offset_too_large() {
        let options = FileOptions::default().last_modified_time(FileDateTime::Zero);

        assert!(matches!(
            build_file_header("a", &options, b"", u32::MAX as u64),
            Err(ArchiveError::ArchiveTooLarge { .. })
        ));
    }

    #[test]
    fn central_directory_size_matches_headers() {
        let options = FileOptions::default().last_modified_time(FileDateTime::Zero);
        let mut data = SubZipArchiveData::default();
        let mut desc = ArchiveDescriptor::new(200);

        for (name, payload) in [("a.png", b"aaa".as_ref()), ("dir/b.png", b"".as_ref())] {
            let (_, entry) = build_file_header(name, &options, payload, 0).unwrap();
            build_central_directory_file_header(&mut desc, &entry);
            data.add_archive_file_entry(entry);
        }

        assert_eq!(central_directory_size(&data), desc.len());
    }
}
