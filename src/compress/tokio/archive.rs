use super::async_wrapper::AsyncWriteWrapper;

use crate::archive_common::ArchiveDescriptor;
use crate::compress::common::{
    build_central_directory_end, build_central_directory_file_header, build_file_header,
    central_directory_size, validate_entry, SubZipArchiveData,
};
use crate::compress::FileOptions;
use crate::error::ArchiveError;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

/// A zip archive.
///
/// Create a zip archive using [`new`](Self::new()), then append files one by
/// one using the [`append`](Self::append()) function. When finished, use the
/// [`finalize`](Self::finalize()) function.
///
/// The bytes are the same as the ones produced by
/// [`std::archive::ZipArchive`](crate::compress::std::archive::ZipArchive) and
/// [`create_zip`](crate::create_zip) for the same entries.
///
/// # Features
///
/// Requires `tokio` feature
pub struct ZipArchive<W: AsyncWrite + Unpin> {
    sink: AsyncWriteWrapper<W>,
    data: SubZipArchiveData,
}

impl<W: AsyncWrite + Unpin> ZipArchive<W> {
    /// Create a new zip archive, using the underlying [`AsyncWrite`] to write files' header and payload.
    pub fn new(sink: W) -> Self {
        Self {
            sink: AsyncWriteWrapper::new(sink),
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
    pub async fn append(
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

        self.sink.write_all(file_header.buffer()).await?;
        self.sink.write_all(payload).await?;

        self.data.add_archive_file_entry(archive_file_entry);
        self.data.archive_size = self.sink.get_written_bytes_count();

        Ok(())
    }

    /// Finalize the archive by writing the necessary metadata to the end of the archive.
    ///
    /// Returns the archive size (bytes) and the [AsyncWrite] object passed at creation.
    pub async fn finalize(mut self) -> Result<(u64, W), ArchiveError> {
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

        self.sink.write_all(central_directory_header.buffer()).await?;
        self.sink.write_all(end_of_central_directory.buffer()).await?;
        self.sink.flush().await?;

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
