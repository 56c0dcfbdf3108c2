//! Pull-based streaming decoder: one uploaded buffer in, a finite sequence
//! of [`RawRecord`] out, header line consumed up front and never emitted.

use std::sync::Arc;

use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord};
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::model::RawRecord;

/// Terminal decoder failure: malformed framing (unterminated quote, invalid
/// encoding) or I/O underneath it. Once framing is lost the position of every
/// later row is untrustworthy, so this aborts the whole import rather than
/// becoming a per-row error.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct DecodeError(#[from] csv_async::Error);

/// Lazy, finite, non-restartable sequence of data rows in file order.
///
/// Owns its reader; there is no way to rewind or re-pull. Each
/// [`next_record`](Self::next_record) call reads exactly one row, so the
/// caller controls how fast input is consumed (the coordinator uses this to
/// flush batches before pulling more).
pub struct RecordStream<R> {
    inner: AsyncReader<R>,
    headers: Arc<[String]>,
    row: StringRecord,
}

impl<R> RecordStream<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Consume the header line and set up the record sequence. Header-level
    /// framing problems surface here, before the first pull.
    pub async fn open(reader: R) -> Result<Self, DecodeError> {
        let mut inner = AsyncReaderBuilder::new()
            .has_headers(true)
            // Short rows become absent columns for the validator to report,
            // instead of aborting the file.
            .flexible(true)
            .buffer_capacity(1 << 20)
            .create_reader(reader);

        let mut names: Vec<String> = inner.headers().await?.iter().map(str::to_string).collect();
        // Excel exports lead with a BOM; keep it out of the first header name.
        if let Some(first) = names.first_mut() {
            *first = first.trim_start_matches('\u{feff}').to_string();
        }

        Ok(Self {
            inner,
            headers: Arc::from(names),
            row: StringRecord::new(),
        })
    }

    /// Column names from the header line, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Next data row, or `None` once input is exhausted.
    pub async fn next_record(&mut self) -> Result<Option<RawRecord>, DecodeError> {
        if self.inner.read_record(&mut self.row).await? {
            let fields = self.row.iter().map(str::to_string).collect();
            Ok(Some(RawRecord::new(Arc::clone(&self.headers), fields)))
        } else {
            Ok(None)
        }
    }
}
