use crate::constants::{CENTRAL_DIRECTORY_END_SIGNATURE, CENTRAL_DIRECTORY_ENTRY_SIGNATURE};
use crate::error::ArchiveError;
use crate::types::ArchiveFileEntry;

/// Little-endian byte sink used to assemble headers before they reach the output.
#[derive(Debug)]
pub struct ArchiveDescriptor {
    buffer: Vec<u8>,
}

impl ArchiveDescriptor {
    pub fn new(capacity: usize) -> ArchiveDescriptor {
        ArchiveDescriptor {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u16(&mut self, val: u16) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u32(&mut self, val: u32) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_bytes(&mut self, val: &[u8]) {
        self.buffer.extend_from_slice(val);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

/// Cursor over an in-memory header block. Every read is bounds checked.
#[derive(Default)]
pub struct ArchiveDescriptorReader {
    index: usize,
}

macro_rules! read_type {
    ($self:expr, $stream:expr, $typ:ty) => {{
        let bytes = $self.take($stream, ::std::mem::size_of::<$typ>())?;
        let mut read = [0u8; ::std::mem::size_of::<$typ>()];
        read.copy_from_slice(bytes);

        Ok(<$typ>::from_le_bytes(read))
    }};
}

impl ArchiveDescriptorReader {
    pub fn new() -> ArchiveDescriptorReader {
        ArchiveDescriptorReader { index: 0 }
    }

    pub fn get_index(&self) -> usize {
        self.index
    }

    fn take<'s>(&mut self, stream: &'s [u8], len: usize) -> Result<&'s [u8], ArchiveError> {
        let upper_bound = self.index.checked_add(len).filter(|&ub| ub <= stream.len());

        match upper_bound {
            Some(upper_bound) => {
                let slice = &stream[self.index..upper_bound];
                self.index = upper_bound;
                Ok(slice)
            }
            None => Err(ArchiveError::BadArchiveStructure(format!(
                "unexpected end of record: {} bytes needed at index {}, {} available",
                len,
                self.index,
                stream.len()
            ))),
        }
    }

    pub fn read_u32(&mut self, stream: &[u8]) -> Result<u32, ArchiveError> {
        read_type!(self, stream, u32)
    }

    pub fn read_u16(&mut self, stream: &[u8]) -> Result<u16, ArchiveError> {
        read_type!(self, stream, u16)
    }

    pub fn read_bytes(&mut self, stream: &[u8], len: usize) -> Result<Vec<u8>, ArchiveError> {
        Ok(self.take(stream, len)?.to_owned())
    }

    pub fn skip(&mut self, stream: &[u8], len: usize) -> Result<(), ArchiveError> {
        self.take(stream, len).map(|_| ())
    }

    /// Parse one central directory file header starting at the current index.
    pub fn read_central_directory_entry(
        &mut self,
        stream: &[u8],
    ) -> Result<ArchiveFileEntry, ArchiveError> {
        let signature = self.read_u32(stream)?;
        if signature != CENTRAL_DIRECTORY_ENTRY_SIGNATURE {
            return Err(ArchiveError::BadArchiveStructure(format!(
                "central directory entry signature expected, found {:#010x}",
                signature
            )));
        }

        let version_made_by = self.read_u16(stream)?;
        let version_needed = self.read_u16(stream)?;
        let general_purpose_flags = self.read_u16(stream)?;
        let compression_method = self.read_u16(stream)?;
        let last_mod_file_time = self.read_u16(stream)?;
        let last_mod_file_date = self.read_u16(stream)?;
        let crc32 = self.read_u32(stream)?;
        let compressed_size = self.read_u32(stream)?;
        let uncompressed_size = self.read_u32(stream)?;
        let file_name_len = self.read_u16(stream)?;
        let extra_field_length = self.read_u16(stream)?;
        let file_comment_length = self.read_u16(stream)?;
        let _disk_number_start = self.read_u16(stream)?;
        let internal_file_attributes = self.read_u16(stream)?;
        let external_file_attributes = self.read_u32(stream)?;
        let offset = self.read_u32(stream)?;
        let file_name_as_bytes = self.read_bytes(stream, file_name_len as usize)?;
        self.skip(stream, extra_field_length as usize)?;
        self.skip(stream, file_comment_length as usize)?;

        Ok(ArchiveFileEntry {
            version_made_by,
            version_needed,
            general_purpose_flags,
            compression_method,
            last_mod_file_time,
            last_mod_file_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_as_bytes,
            extra_field_length,
            file_comment_length,
            internal_file_attributes,
            external_file_attributes,
            offset,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CentralDirectoryEnd {
    pub number_of_this_disk: u16,
    pub number_of_the_disk_with_central_directory: u16,
    pub total_number_of_entries_on_this_disk: u16,
    pub total_number_of_entries_in_the_central_directory: u16,
    pub central_directory_size: u32,
    pub offset_of_start_of_central_directory: u32,
    pub archive_comment: Vec<u8>,
}

impl CentralDirectoryEnd {
    pub fn new(number_of_entries: u16, size: u32, offset: u32) -> Self {
        Self {
            total_number_of_entries_on_this_disk: number_of_entries,
            total_number_of_entries_in_the_central_directory: number_of_entries,
            central_directory_size: size,
            offset_of_start_of_central_directory: offset,
            ..Default::default()
        }
    }

    pub fn zip_file_comment_length(&self) -> u16 {
        self.archive_comment.len() as u16
    }

    pub fn create_end_of_central_directory(
        &self,
        end_of_central_directory: &mut ArchiveDescriptor,
    ) {
        end_of_central_directory.write_u32(CENTRAL_DIRECTORY_END_SIGNATURE);
        end_of_central_directory.write_u16(self.number_of_this_disk);
        end_of_central_directory.write_u16(self.number_of_the_disk_with_central_directory);
        end_of_central_directory.write_u16(self.total_number_of_entries_on_this_disk);
        end_of_central_directory.write_u16(self.total_number_of_entries_in_the_central_directory);
        end_of_central_directory.write_u32(self.central_directory_size);
        end_of_central_directory.write_u32(self.offset_of_start_of_central_directory);
        end_of_central_directory.write_u16(self.zip_file_comment_length());
        end_of_central_directory.write_bytes(&self.archive_comment);
    }

    /// Parse the record from a buffer that starts right after its signature.
    pub fn parse(stream: &[u8]) -> Result<Self, ArchiveError> {
        let mut indexer = ArchiveDescriptorReader::new();

        let number_of_this_disk = indexer.read_u16(stream)?;
        let number_of_the_disk_with_central_directory = indexer.read_u16(stream)?;
        let total_number_of_entries_on_this_disk = indexer.read_u16(stream)?;
        let total_number_of_entries_in_the_central_directory = indexer.read_u16(stream)?;
        let central_directory_size = indexer.read_u32(stream)?;
        let offset_of_start_of_central_directory = indexer.read_u32(stream)?;
        let comment_length = indexer.read_u16(stream)?;
        let archive_comment = indexer.read_bytes(stream, comment_length as usize)?;

        Ok(Self {
            number_of_this_disk,
            number_of_the_disk_with_central_directory,
            total_number_of_entries_on_this_disk,
            total_number_of_entries_in_the_central_directory,
            central_directory_size,
            offset_of_start_of_central_directory,
            archive_comment,
        })
    }
}

#[cfg(test)]
#[path = "./tests/archive_common.rs"]
mod archive_common_tests;
