//! Turning `data:` URLs, as exported by an image canvas, into archive entries.
//!
//! ```
//! use storezip::data_url::DataUrl;
//!
//! let url = DataUrl::parse("data:image/png;base64,iVBORw0KGgo=")?;
//! assert_eq!(url.mime_type(), "image/png");
//! assert_eq!(url.extension(), "png");
//! assert_eq!(url.data(), b"\x89PNG\r\n\x1a\n");
//! # Ok::<(), storezip::error::ArchiveError>(())
//! ```

use base64::Engine;

use crate::error::ArchiveError;

const DEFAULT_MIME_TYPE: &str = "text/plain";

/// A decoded `data:[<mime type>][;<parameter>]*[;base64],<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime_type: String,
    data: Vec<u8>,
}

impl DataUrl {
    pub fn parse(url: &str) -> Result<Self, ArchiveError> {
        let url = url.trim();
        let rest = match url.get(..5) {
            Some(scheme) if scheme.eq_ignore_ascii_case("data:") => &url[5..],
            _ => {
                return Err(ArchiveError::InvalidDataUrl(
                    "missing 'data:' scheme".to_owned(),
                ))
            }
        };

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ArchiveError::InvalidDataUrl("missing ',' separator".to_owned()))?;

        let mut parameters = header.split(';');
        let mime_type = match parameters.next().map(str::trim) {
            Some(mime_type) if !mime_type.is_empty() => mime_type.to_ascii_lowercase(),
            _ => DEFAULT_MIME_TYPE.to_owned(),
        };
        let is_base64 = parameters.any(|parameter| parameter.trim().eq_ignore_ascii_case("base64"));

        let data = if is_base64 {
            decode_base64_lenient(payload)?
        } else {
            percent_decode(payload)?
        };

        Ok(Self { mime_type, data })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// File extension matching the mime type, `bin` when unknown.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/avif" => "avif",
            "image/svg+xml" => "svg",
            "text/plain" => "txt",
            "application/json" => "json",
            _ => "bin",
        }
    }
}

/// Decode a data URL into its raw bytes.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ArchiveError> {
    DataUrl::parse(url).map(DataUrl::into_data)
}

/// Base64 as found in the wild: line breaks, spaces and missing padding are accepted.
fn decode_base64_lenient(payload: &str) -> Result<Vec<u8>, ArchiveError> {
    let cleaned: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let cleaned = percent_decode(&cleaned)?;

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    // only trailing padding may go, an '=' inside the payload stays invalid
    let unpadded_len = cleaned.len() - cleaned.iter().rev().take_while(|&&b| b == b'=').count();
    base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(&cleaned[..unpadded_len])
        .map_err(|e| ArchiveError::InvalidDataUrl(format!("invalid base64 payload: {}", e)))
}

fn percent_decode(payload: &str) -> Result<Vec<u8>, ArchiveError> {
    let bytes = payload.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == b'%' {
            let escape = bytes
                .get(index + 1..index + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| {
                    ArchiveError::InvalidDataUrl(format!("bad percent escape at {}", index))
                })?;
            decoded.push(escape);
            index += 3;
        } else {
            decoded.push(bytes[index]);
            index += 1;
        }
    }

    Ok(decoded)
}

/// Decode many data URLs concurrently on the blocking pool.
///
/// The returned buffers follow the order of `urls`. When several URLs are
/// invalid, the error of the first one in that order is returned.
#[cfg(feature = "tokio")]
pub async fn decode_data_urls<I, S>(urls: I) -> Result<Vec<Vec<u8>>, ArchiveError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    decode_all(urls).await.map(|decoded| {
        decoded
            .into_iter()
            .map(DataUrl::into_data)
            .collect()
    })
}

#[cfg(feature = "tokio")]
async fn decode_all<I, S>(urls: I) -> Result<Vec<DataUrl>, ArchiveError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let handles: Vec<_> = urls
        .into_iter()
        .map(|url| {
            let url: String = url.into();
            tokio::task::spawn_blocking(move || DataUrl::parse(&url))
        })
        .collect();

    let mut decoded = Vec::with_capacity(handles.len());
    let mut handles = handles.into_iter();
    while let Some(handle) = handles.next() {
        match handle.await.map_err(ArchiveError::from).and_then(|parsed| parsed) {
            Ok(url) => decoded.push(url),
            Err(e) => {
                // decodes already running on the pool complete, queued ones never start
                let aborted = handles.len();
                for pending in handles {
                    pending.abort();
                }
                tracing::debug!(aborted, error = %e, "data URL decoding failed");
                return Err(e);
            }
        }
    }

    tracing::debug!(count = decoded.len(), "data URLs decoded");

    Ok(decoded)
}

/// Decode data URLs concurrently and bundle them into one stored archive.
///
/// Entries are named `<prefix>-<n>.<extension>`, `n` counting from 1 in the
/// order of `urls`, the extension following each URL's mime type.
#[cfg(feature = "tokio")]
pub async fn bundle_data_urls<I, S>(
    prefix: &str,
    urls: I,
    modified_time: crate::types::FileDateTime,
) -> Result<Vec<u8>, ArchiveError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    use crate::compress::{create_zip, ZipEntry};

    let decoded = decode_all(urls).await?;

    let entries: Vec<ZipEntry> = decoded
        .into_iter()
        .enumerate()
        .map(|(index, url)| {
            let name = format!("{}-{}.{}", prefix, index + 1, url.extension());
            ZipEntry::new(name, url.into_data()).modified_time(modified_time)
        })
        .collect();

    create_zip(&entries)
}
