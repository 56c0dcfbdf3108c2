//! Import coordinator: drives the decoder, applies the validator, buffers
//! valid rows, and submits bounded batches to the persistence gateway.

use std::io::Cursor;
use std::time::Instant;

use chrono::Utc;
use tokio::io::AsyncRead;
use tracing::{error, info, warn};

use crate::decode::RecordStream;
use crate::gateway::ListingGateway;
use crate::intake::{build_upload_reader, UploadMeta};
use crate::model::{ImportReport, ImportSummary, NewListing, RowError};
use crate::validate::validate_row;
use crate::{ImportError, ImportResult};

/// Validated records accumulated before one persistence call. Bounds peak
/// memory independent of file size and gives partial progress when a later
/// batch fails.
pub const BATCH_SIZE: usize = 1000;

/// Run the full pipeline over an uploaded byte buffer.
///
/// The buffer is expected to have passed [`check_upload`](crate::check_upload)
/// already; zero-byte input is still rejected here so the decoder never sees
/// it. `caller_id` is the opaque identity the auth layer resolved for this
/// upload; it is stamped onto every persisted record.
pub async fn run_import<G>(
    bytes: Vec<u8>,
    meta: &UploadMeta,
    caller_id: &str,
    gateway: &G,
) -> ImportResult<ImportReport>
where
    G: ListingGateway,
{
    if bytes.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    let reader = build_upload_reader(Cursor::new(bytes), meta);
    let stream = RecordStream::open(reader).await?;
    import_records(stream, caller_id, gateway).await
}

/// Decode-validate-buffer loop over an already-open record stream.
///
/// Single logical sequence: one row is pulled, validated, and buffered at a
/// time, and a full buffer is flushed (awaited) before the next pull. Row
/// numbers are 1-based over data rows and are never renumbered, so the error
/// report lines up with the uploaded file.
pub async fn import_records<R, G>(
    mut stream: RecordStream<R>,
    caller_id: &str,
    gateway: &G,
) -> ImportResult<ImportReport>
where
    R: AsyncRead + Unpin + Send,
    G: ListingGateway,
{
    let started = Instant::now();

    let mut buffer: Vec<NewListing> = Vec::with_capacity(BATCH_SIZE);
    let mut errors: Vec<RowError> = Vec::new();
    let mut valid_count: u64 = 0;
    let mut stored_count: u64 = 0;
    let mut row: u64 = 0;

    while let Some(record) = stream.next_record().await? {
        row += 1;
        match validate_row(&record) {
            Ok(draft) => {
                valid_count += 1;
                buffer.push(draft.into_record(caller_id, Utc::now()));
                if buffer.len() >= BATCH_SIZE {
                    stored_count += flush_batch(gateway, &mut buffer, row).await?;
                }
            }
            Err(message) => errors.push(RowError {
                row,
                data: record,
                error: message,
            }),
        }
    }

    if valid_count == 0 {
        warn!(caller = caller_id, rows = row, "upload had no valid records");
        return Err(ImportError::NoValidRows { errors });
    }

    if !buffer.is_empty() {
        stored_count += flush_batch(gateway, &mut buffer, row).await?;
    }

    let summary = ImportSummary {
        total_processed: valid_count + errors.len() as u64,
        successful: stored_count,
        failed: errors.len() as u64,
        processing_time_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        caller = caller_id,
        total = summary.total_processed,
        successful = summary.successful,
        failed = summary.failed,
        elapsed_ms = summary.processing_time_ms,
        "import complete"
    );

    Ok(ImportReport {
        summary,
        validation_errors: errors,
    })
}

async fn flush_batch<G: ListingGateway>(
    gateway: &G,
    buffer: &mut Vec<NewListing>,
    through_row: u64,
) -> ImportResult<u64> {
    let batch: Vec<NewListing> = buffer.drain(..).collect();
    let size = batch.len();
    match gateway.insert_many(batch).await {
        Ok(stored) => {
            info!(batch = size, through_row, "batch persisted");
            Ok(stored.len() as u64)
        }
        Err(err) => {
            // Full detail goes to the log; the response stays opaque so the
            // caller knows success is undetermined rather than retrying the
            // whole file blindly.
            error!(batch = size, through_row, error = %err, "bulk insert failed, aborting import");
            Err(ImportError::Gateway(err))
        }
    }
}
