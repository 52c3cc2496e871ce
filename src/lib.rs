//! A library for bundling in-memory files, typically edited or generated images,
//! into a single ZIP archive ready to be downloaded.
//!
//! Entries are *stored*: the bytes are copied verbatim, without compression, which
//! keeps the writer free of any codec and makes the output size known in advance
//! (see [`tools::archive_size`]). Only the classic (non ZIP64) format is written,
//! so the archives open with any ZIP tool.
//!
//! The current implementation is based on
//!
//! [PKWARE's APPNOTE.TXT v6.3.10](https://pkware.cachefly.net/webdocs/casestudies/APPNOTE.TXT)
//!
//!
//! ## Features
//!
//! Feature  | Description
//! ---------|------
//! tokio    | Asynchronous writer over [tokio::io::AsyncWrite] and concurrent decoding of data URLs
//!
//!
//! ## Examples
//!
//! Build an archive in memory:
//!
//!```rust
//! use storezip::{create_zip, types::FileDateTime, ZipEntry};
//!
//! let archive = create_zip(&[
//!     ZipEntry::new("a.png", vec![0xFF; 10]),
//!     ZipEntry::new("b.png", Vec::new()).modified_time(FileDateTime::Zero),
//! ])?;
//!
//! assert_eq!(archive.len() as u64, storezip::tools::archive_size([("a.png", 10), ("b.png", 0)]));
//! # Ok::<(), storezip::error::ArchiveError>(())
//!```
//!
//! Write an archive to a file with [tokio]:
//!
//!```no_run
//! use storezip::{compress::tokio::archive::ZipArchive, compress::FileOptions, error::ArchiveError};
//! use tokio::fs::File;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ArchiveError> {
//!     let file = File::create("archive.zip").await?;
//!
//!     let options = FileOptions::default();
//!     let mut archive = ZipArchive::new(file);
//!     archive.append("file1.txt", &options, b"hello\n").await?;
//!     archive.append("file2.txt", &options, b"world\n").await?;
//!     archive.finalize().await?;
//!
//!     Ok(())
//! }
//!```

mod constants;

mod archive_common;
pub mod compress;
pub mod crc;
pub mod data_url;
pub mod error;
pub mod tools;
pub mod types;
pub mod uncompress;

pub use compress::{create_zip, FileOptions, ZipEntry};
pub use constants::ZIP_MIME_TYPE;
