//! Transport-level constraints and reader construction for one uploaded CSV
//! part. Everything here runs before the pipeline sees a single record, and
//! every failure is a client error that never touches the import counters.

use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use encoding_rs::Encoding;
use thiserror::Error;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use crate::model::ImportResponse;
use crate::transcode::CharsetTranscoder;

/// Cap on one uploaded CSV part (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Media-type essence the upload part must declare.
const CSV_MEDIA_TYPE: &str = "text/csv";

/// What the transport layer knows about the uploaded part.
#[derive(Debug, Clone)]
pub struct UploadMeta {
    /// Media-type essence, lowercased, e.g. "text/csv".
    pub content_type: String,
    /// e.g. "gzip", "zstd", or empty for identity.
    pub content_encoding: String,
    /// Original filename, used as an extension fallback for compression.
    pub name_hint: String,
    /// Character encoding of the decompressed bytes (defaults to UTF-8).
    pub charset: &'static Encoding,
}

impl Default for UploadMeta {
    fn default() -> Self {
        Self {
            content_type: CSV_MEDIA_TYPE.to_string(),
            content_encoding: String::new(),
            name_hint: String::new(),
            charset: encoding_rs::UTF_8,
        }
    }
}

impl UploadMeta {
    /// Parse a raw `Content-Type` header value, honoring a `charset`
    /// parameter (e.g. `text/csv; charset=windows-1252`).
    pub fn from_content_type(raw: &str) -> Result<Self, IntakeError> {
        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or("").trim().to_ascii_lowercase();

        let mut charset = encoding_rs::UTF_8;
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if key.trim().eq_ignore_ascii_case("charset") {
                let label = value.trim().trim_matches('"');
                charset = Encoding::for_label(label.as_bytes())
                    .ok_or_else(|| IntakeError::UnsupportedCharset(label.to_string()))?;
            }
        }

        Ok(Self {
            content_type: essence,
            charset,
            ..Self::default()
        })
    }

    pub fn with_name_hint(mut self, name: impl Into<String>) -> Self {
        self.name_hint = name.into();
        self
    }

    pub fn with_content_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.content_encoding = encoding.into();
        self
    }
}

/// Upload rejected before decoding. `MissingFile` is raised by the HTTP
/// layer when the expected multipart field is absent; the remaining variants
/// come out of [`check_upload`].
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("No file provided")]
    MissingFile,
    #[error("Empty CSV file provided")]
    EmptyFile,
    #[error("unsupported content type {0:?}, expected text/csv")]
    UnsupportedMediaType(String),
    #[error("unsupported charset {0:?}")]
    UnsupportedCharset(String),
    #[error("file is {len} bytes, over the {max} byte limit")]
    TooLarge { len: usize, max: usize },
}

impl From<IntakeError> for ImportResponse {
    fn from(err: IntakeError) -> Self {
        ImportResponse::rejected(err.to_string())
    }
}

/// Enforce the transport constraints on an uploaded part of `len` bytes.
pub fn check_upload(meta: &UploadMeta, len: usize) -> Result<(), IntakeError> {
    if meta.content_type != CSV_MEDIA_TYPE {
        return Err(IntakeError::UnsupportedMediaType(meta.content_type.clone()));
    }
    if len == 0 {
        return Err(IntakeError::EmptyFile);
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(IntakeError::TooLarge {
            len,
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Wrap the raw upload so the record stream always sees plain UTF-8 CSV:
/// optional gzip/zstd decompression chosen from the content encoding (with
/// the filename extension as fallback), then charset transcoding when the
/// declared charset is not already UTF-8.
pub fn build_upload_reader<R>(raw: R, meta: &UploadMeta) -> Box<dyn AsyncRead + Unpin + Send>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let ce = meta.content_encoding.to_ascii_lowercase();
    let is_gzip = ce.split(',').any(|s| s.trim() == "gzip") || meta.name_hint.ends_with(".gz");
    let is_zstd = ce.split(',').any(|s| s.trim() == "zstd") || meta.name_hint.ends_with(".zst");

    let buf = BufReader::with_capacity(1 << 20, raw);
    let decompressed: Box<dyn AsyncRead + Unpin + Send> = if is_gzip {
        Box::new(GzipDecoder::new(buf))
    } else if is_zstd {
        Box::new(ZstdDecoder::new(buf))
    } else {
        Box::new(buf)
    };

    if meta.charset == encoding_rs::UTF_8 {
        decompressed
    } else {
        let framed = FramedRead::new(decompressed, CharsetTranscoder::new(meta.charset));
        Box::new(StreamReader::new(framed))
    }
}
