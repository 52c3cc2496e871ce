use super::write_wrapper::WriteWrapper;

use crate::archive_common::ArchiveDescriptor;
use crate::compress::common::{
    build_central_directory_end, build_central_directory_file_header, build_file_header,
    central_directory_size, validate_entry, SubZipArchiveData,
};
use crate::compress::FileOptions;
use crate::error::ArchiveError;
use std::io::Write;
use tracing::{debug, trace};

/// A zip archive.
///
/// Create a zip archive using [`new`](Self::new()), then append files one by
/// one using the [`append`](Self::append()) function. When finished, use the
/// [`finalize`](Self::finalize()) function.
///
/// ```
/// use storezip::compress::{std::archive::ZipArchive, FileOptions};
///
/// let mut archive = ZipArchive::new(Vec::new());
/// archive.append("file1.txt", &FileOptions::default(), b"hello\n")?;
/// let (size, buffer) = archive.finalize()?;
///
/// assert_eq!(size as usize, buffer.len());
/// # Ok::<(), storezip::error::ArchiveError>(())
/// ```
pub struct ZipArchive<W: Write> {
    sink: WriteWrapper<W>,
    data: SubZipArchiveData,
}

impl<W: Write> ZipArchive<W> {
    /// Create a new zip archive, using the underlying [`Write`] to write
    /// files' header and payload.
    pub fn new(sink: W) -> Self {
        Self {
            sink: WriteWrapper::new(sink),
            data: SubZipArchiveData::default(),
        }
    }

    /// Get archive current total bytes written.
    pub fn get_archive_size(&self) -> u64 {
        self.sink.get_written_bytes_count()
    }

    /// Append a new stored entry to the archive.
    ///
    /// # Arguments
    /// * `file_name` - The name of the archive entry
    /// * `options` - Entry's archive options
    /// * `payload` - The entry's content, written verbatim
    ///
    /// Fails without writing anything if the entry does not fit a non ZIP64 archive.
    pub fn append(
        &mut self,
        file_name: &str,
        options: &FileOptions,
        payload: &[u8],
    ) -> Result<(), ArchiveError> {
        validate_entry(file_name, payload.len(), &self.data)?;

        let file_header_offset = self.sink.get_written_bytes_count();
        let (file_header, archive_file_entry) =
            build_file_header(file_name, options, payload, file_header_offset)?;

        trace!(
            file_name,
            offset = file_header_offset,
            size = payload.len(),
            "appending stored entry"
        );

        self.sink.write_all(file_header.buffer())?;
        self.sink.write_all(payload)?;

        self.data.add_archive_file_entry(archive_file_entry);
        self.data.archive_size = self.sink.get_written_bytes_count();

        Ok(())
    }

    /// Finalize the archive by writing the necessary metadata to the end of the archive.
    ///
    /// Returns the archive size (bytes) and the [Write] object passed at creation.
    pub fn finalize(mut self) -> Result<(u64, W), ArchiveError> {
        let central_directory_offset = self.sink.get_written_bytes_count();

        let mut central_directory_header =
            ArchiveDescriptor::new(central_directory_size(&self.data));
        for file_info in self.data.iter() {
            build_central_directory_file_header(&mut central_directory_header, file_info);
        }

        let central_directory_size = central_directory_header.len() as u64;
        let end_of_central_directory = build_central_directory_end(
            &self.data,
            central_directory_offset,
            central_directory_size,
        )?;

        self.sink.write_all(central_directory_header.buffer())?;
        self.sink.write_all(end_of_central_directory.buffer())?;
        self.sink.flush()?;

        self.data.archive_size = self.sink.get_written_bytes_count();

        debug!(
            entries = self.data.len(),
            central_directory_offset,
            central_directory_size,
            archive_size = self.data.archive_size,
            "archive finalized"
        );

        Ok((self.data.archive_size, self.sink.retrieve_writer()))
    }
}
